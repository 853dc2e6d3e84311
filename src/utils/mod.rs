//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - File resolution for multi-file documents
//! - Permissive source decoding

pub mod decode;
pub mod error;
pub mod files;

// Re-export commonly used items
pub use decode::decode_source;
pub use error::{ExtractError, ExtractResult, Interrupt, ScanResult, SkipReason};
pub use files::{
    FileResolveError, FileResolver, MemoryFileResolver, NoopFileResolver, StdFileResolver,
};
