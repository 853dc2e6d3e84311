//! Permissive source decoding.
//!
//! Sources are read as bytes and decoded in order of confidence:
//! 1. BOM (UTF-8, UTF-16 LE/BE)
//! 2. valid UTF-8
//! 3. Windows-1252, which maps every byte to some character
//!
//! Decoding therefore never fails; a file in an unexpected legacy encoding
//! comes out with a few wrong accented letters rather than aborting.

use encoding_rs::{Encoding, WINDOWS_1252};

/// Decode raw source bytes into text.
pub fn decode_source(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            log::debug!("source is not UTF-8, decoding as {}", WINDOWS_1252.name());
            let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}
