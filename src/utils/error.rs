//! Error handling for proof extraction
//!
//! Failures come in three severities:
//!
//! - proof-local ([`Interrupt::SkipProof`]): the proof being collected is
//!   dropped, scanning resumes after its `\end{proof}`
//! - file-local ([`ExtractError`]): the whole file is abandoned
//! - include-local ([`FileResolveError`](crate::utils::files::FileResolveError)):
//!   logged, the including file continues

use std::fmt;

/// File-level extraction error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// IO error (reading the input or writing output)
    Io { message: String },
    /// Inline or display math ran past its token ceiling
    RunawayMath { limit: usize },
    /// An environment or proof ran past its token ceiling
    RunawayEnvironment { name: String, limit: usize },
    /// Skipping a false conditional found no `\fi` in time
    RunawayConditional { limit: usize },
    /// The file as a whole consumed too many tokens
    TokenBudgetExceeded { limit: usize },
    /// Math and skipped environments nested past the depth ceiling
    NestingTooDeep { limit: usize },
    /// End of input while inside math
    UnterminatedMath,
    /// End of input, or `\end{document}`, in a structurally open context
    UnexpectedEnd { context: String },
    /// Malformed include command
    Include { path: String, message: String },
    /// Internal error
    Internal { message: String },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Io { message } => write!(f, "IO error: {}", message),
            ExtractError::RunawayMath { limit } => {
                write!(f, "Runaway math: no closer within {} tokens", limit)
            }
            ExtractError::RunawayEnvironment { name, limit } => {
                write!(f, "Runaway environment '{}': no end within {} tokens", name, limit)
            }
            ExtractError::RunawayConditional { limit } => {
                write!(f, "Runaway conditional: no \\fi within {} tokens", limit)
            }
            ExtractError::TokenBudgetExceeded { limit } => {
                write!(f, "Token budget of {} exceeded", limit)
            }
            ExtractError::NestingTooDeep { limit } => {
                write!(f, "Math or skipped environments nested deeper than {}", limit)
            }
            ExtractError::UnterminatedMath => write!(f, "Unterminated math at end of input"),
            ExtractError::UnexpectedEnd { context } => {
                write!(f, "Unexpected end of input in {}", context)
            }
            ExtractError::Include { path, message } => {
                write!(f, "Include error for '{}': {}", path, message)
            }
            ExtractError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

// Convenience constructors for errors
impl ExtractError {
    pub fn unexpected_end(context: impl Into<String>) -> Self {
        ExtractError::UnexpectedEnd {
            context: context.into(),
        }
    }

    pub fn runaway_environment(name: impl Into<String>, limit: usize) -> Self {
        ExtractError::RunawayEnvironment {
            name: name.into(),
            limit,
        }
    }

    pub fn include(path: impl Into<String>, message: impl Into<String>) -> Self {
        ExtractError::Include {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ExtractError::Internal {
            message: message.into(),
        }
    }
}

/// Why a proof was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A math-only command showed up in prose (usually a missing `$`)
    MathOutsideMath { command: String },
    /// A braced argument ran into `\end{proof}` before its closing brace
    RunawayArgument,
    /// Input ended while reading an argument inside a proof
    EndOfInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MathOutsideMath { command } => {
                write!(f, "math-only command \\{} outside math", command)
            }
            SkipReason::RunawayArgument => write!(f, "runaway argument"),
            SkipReason::EndOfInput => write!(f, "end of input inside an argument"),
        }
    }
}

/// Control flow out of the interpreter: every scanning routine returns
/// `Result<_, Interrupt>` and the collector branches on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// Abandon the current proof only
    SkipProof(SkipReason),
    /// Abandon the file
    Fatal(ExtractError),
}

impl From<ExtractError> for Interrupt {
    fn from(err: ExtractError) -> Self {
        Interrupt::Fatal(err)
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::SkipProof(reason) => write!(f, "proof skipped: {}", reason),
            Interrupt::Fatal(err) => write!(f, "{}", err),
        }
    }
}

/// Result type for interpreter routines
pub type ScanResult<T> = Result<T, Interrupt>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractError::runaway_environment("figure", 10);
        let msg = err.to_string();
        assert!(msg.contains("figure"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ExtractError = io.into();
        assert!(matches!(err, ExtractError::Io { .. }));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_interrupt_from_error() {
        let interrupt: Interrupt = ExtractError::UnterminatedMath.into();
        assert_eq!(interrupt, Interrupt::Fatal(ExtractError::UnterminatedMath));
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::MathOutsideMath {
            command: "frac".into(),
        };
        assert!(reason.to_string().contains("\\frac"));
    }
}
