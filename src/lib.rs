//! # texproof
//!
//! Extract the natural-language text of proofs from LaTeX sources.
//!
//! The extractor is a small TeX interpreter: it expands user macros,
//! follows local `\input`/`\usepackage` files, tracks conditionals and
//! skips math, then keeps only the prose inside `proof` environments.
//! Elided content is replaced by fixed markers:
//!
//! - `MATH` for inline, display and environment math
//! - `REF` for `\ref`, `\eqref`, `\autoref`, ...
//! - `CITE` for `\cite` and its variants
//! - `CASE:` for `\item`
//! - `NAME` for names the document does not spell out
//!
//! ## Usage
//!
//! ```rust
//! use texproof::extract_proofs;
//!
//! let proofs = extract_proofs(r"\begin{proof} Let $x$ be given. \end{proof}").unwrap();
//! assert_eq!(proofs[0].as_str(), "Let MATH be given .");
//! ```
//!
//! ### Files and includes
//!
//! ```no_run
//! use std::path::Path;
//! use texproof::{extract_proofs_from_file, ExtractOptions};
//!
//! let result = extract_proofs_from_file(Path::new("paper/main.tex"), &ExtractOptions::default())?;
//! for proof in &result.proofs {
//!     println!("{}", proof);
//! }
//! # Ok::<(), texproof::ExtractError>(())
//! ```

/// Core extraction modules
pub mod core;

/// Data layer - static command, environment and file tables
pub mod data;

/// Utility modules
pub mod utils;

/// Batch driver over directory trees
pub mod batch;

use std::path::Path;

pub use crate::core::collector::{FileProofs, Proof, ProofOutcome};
pub use crate::core::context::ExtractOptions;
pub use crate::core::engine::{Engine, EngineWarning};
pub use batch::{run_batch, BatchOptions, BatchSummary};
pub use utils::error::{ExtractError, ExtractResult, SkipReason};
pub use utils::files::{FileResolver, MemoryFileResolver, NoopFileResolver, StdFileResolver};

/// Extract every proof from a single LaTeX string. Includes are not
/// followed.
pub fn extract_proofs(input: &str) -> ExtractResult<Vec<Proof>> {
    let options = ExtractOptions::no_includes();
    let result = extract_proofs_with(input, "input.tex", &options, &NoopFileResolver)?;
    Ok(result.proofs)
}

/// Extract proofs from `input`, read from `path`, resolving includes with
/// `resolver`.
pub fn extract_proofs_with(
    input: &str,
    path: &str,
    options: &ExtractOptions,
    resolver: &dyn FileResolver,
) -> ExtractResult<FileProofs> {
    Engine::new(input, path, options, resolver).run()
}

/// Read, decode and process one file from disk. Includes are resolved
/// relative to the including file.
pub fn extract_proofs_from_file(
    path: &Path,
    options: &ExtractOptions,
) -> ExtractResult<FileProofs> {
    let bytes = std::fs::read(path)?;
    let text = utils::decode::decode_source(&bytes);
    let resolver = StdFileResolver::new();
    let result = extract_proofs_with(&text, &path.to_string_lossy(), options, &resolver)?;
    log::info!(
        "{}: {} proofs, {} skipped, {} tokens",
        path.display(),
        result.proofs.len(),
        result.skipped.len(),
        result.tokens_consumed
    );
    Ok(result)
}

/// Interpret `input` as the body of a proof and return the collected text.
pub fn render_proof_body(input: &str) -> ExtractResult<String> {
    let options = ExtractOptions::no_includes();
    Engine::new(input, "input.tex", &options, &NoopFileResolver).render_body()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_proofs() {
        let proofs = extract_proofs("\\begin{proof} Let $x$ be given. \\end{proof}").unwrap();
        assert_eq!(proofs.len(), 1);
        assert_eq!(proofs[0].as_str(), "Let MATH be given .");
    }

    #[test]
    fn test_render_proof_body() {
        assert_eq!(render_proof_body("\\cite{a,b} \\ref{thm1}").unwrap(), "CITE REF");
    }

    #[test]
    fn test_extract_from_missing_file() {
        let options = ExtractOptions::default();
        let err = extract_proofs_from_file(Path::new("/nonexistent/x.tex"), &options).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
