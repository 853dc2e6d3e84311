//! Extraction options
//!
//! Limits are counted in tokens consumed from the stream, re-scanned
//! macro expansions included.

use crate::data::fixups::Fixup;
use crate::data::stdlib::StdLibrary;
use std::sync::Arc;

// =============================================================================
// Default Limits
// =============================================================================

/// Tokens `$...$`, `$$...$$`, `\(...\)` or `\[...\]` may span.
pub const DEFAULT_MATH_TOKEN_LIMIT: usize = 20_000;

/// Tokens an environment skip or a single proof may span.
pub const DEFAULT_ENV_TOKEN_LIMIT: usize = 1_000_000;

/// Tokens skipped while looking for the `\fi` of a false conditional.
pub const DEFAULT_CONDITIONAL_TOKEN_LIMIT: usize = 1_000_000;

/// Tokens one file (with everything it includes) may consume.
pub const DEFAULT_FILE_TOKEN_LIMIT: usize = 20_000_000;

/// Deepest `\input` nesting that is still followed.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 5;

/// Deepest nesting of math and skipped environments.
pub const DEFAULT_MAX_SKIP_DEPTH: usize = 128;

/// Options for proof extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Ceiling for one inline or display math span
    pub math_token_limit: usize,
    /// Ceiling for one skipped environment or collected proof
    pub env_token_limit: usize,
    /// Ceiling for skipping a false conditional branch
    pub conditional_token_limit: usize,
    /// Ceiling for the whole file
    pub file_token_limit: usize,
    /// Include depth beyond which `\input` is a no-op
    pub max_include_depth: usize,
    /// Nested math and skipped environments beyond which the file fails
    pub max_skip_depth: usize,
    /// Follow `\input` and `\usepackage` into local files
    /// Default: true
    pub follow_includes: bool,
    /// Distribution files that are never descended into
    pub stdlib: Arc<StdLibrary>,
    /// Per-file source corrections; empty unless loaded
    pub fixups: Vec<Fixup>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            math_token_limit: DEFAULT_MATH_TOKEN_LIMIT,
            env_token_limit: DEFAULT_ENV_TOKEN_LIMIT,
            conditional_token_limit: DEFAULT_CONDITIONAL_TOKEN_LIMIT,
            file_token_limit: DEFAULT_FILE_TOKEN_LIMIT,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_skip_depth: DEFAULT_MAX_SKIP_DEPTH,
            follow_includes: true,
            stdlib: StdLibrary::builtin(),
            fixups: Vec::new(),
        }
    }
}

impl ExtractOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight limits, for interactive debugging of a single file
    pub fn strict() -> Self {
        Self {
            math_token_limit: 5_000,
            env_token_limit: 200_000,
            conditional_token_limit: 200_000,
            file_token_limit: 2_000_000,
            max_skip_depth: 32,
            ..Self::default()
        }
    }

    /// Never read files other than the one being processed
    pub fn no_includes() -> Self {
        Self {
            follow_includes: false,
            ..Self::default()
        }
    }

    pub fn with_stdlib(mut self, stdlib: StdLibrary) -> Self {
        self.stdlib = Arc::new(stdlib);
        self
    }

    pub fn with_fixups(mut self, fixups: Vec<Fixup>) -> Self {
        self.fixups = fixups;
        self
    }
}
