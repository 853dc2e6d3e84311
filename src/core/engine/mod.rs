//! TeX interpreter for proof extraction
//!
//! The engine reads a token stream and keeps only as much of TeX as is
//! needed to find proofs and reduce them to prose:
//!
//! - user macros (`\newcommand`, `\def`, `\let`, `\newenvironment`)
//! - conditionals (primitive `\if...`, `\newif` flags, `ifthen`/`etoolbox`)
//! - includes (`\input`, `\usepackage` of local files)
//! - math and environment skipping
//!
//! Everything else is dispatched through the built-in command table in
//! [`crate::data::commands`].

pub mod args;
pub mod conditional;
pub mod definitions;
pub mod dispatch;
pub mod include;
pub mod lexer;
pub mod macros;
pub mod skip;
pub mod stream;
pub mod token;

pub use lexer::{decomment, lex_source, prepare_source, tokenize};
pub use macros::{EnvironmentDef, MacroDef, MacroTable, Rejection};
pub use stream::TokenStream;
pub use token::{TexToken, TokenList};

use crate::core::collector::{Proof, ProofAccumulator};
use crate::core::context::ExtractOptions;
use crate::utils::error::{ExtractError, Interrupt, ScanResult, SkipReason};
use crate::utils::files::FileResolver;

// ============================================================================
// Warnings
// ============================================================================

/// Structured warning collected while processing a file.
///
/// Warnings never stop processing; they are reported next to the proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineWarning {
    /// An include target could not be found in any candidate location
    IncludeMissing { target: String, from: String },
    /// An include target exists but could not be read
    IncludeUnreadable { path: String, message: String },
    /// Include nesting reached the configured depth
    IncludeDepthExceeded { target: String, depth: usize },
    /// A definition was refused by the macro table
    DefinitionRejected { name: String, reason: Rejection },
    /// `\newenvironment` tried to redefine a proof environment
    ProofRedefinitionIgnored { name: String },
    /// A macro use did not match its parameter text
    ExpansionFailed { name: String },
}

impl EngineWarning {
    /// Convert to a human-readable message
    pub fn message(&self) -> String {
        match self {
            EngineWarning::IncludeMissing { target, from } => {
                format!("Cannot find include target '{}' (included from {})", target, from)
            }
            EngineWarning::IncludeUnreadable { path, message } => {
                format!("Cannot read '{}': {}", path, message)
            }
            EngineWarning::IncludeDepthExceeded { target, depth } => {
                format!(
                    "Include '{}' ignored: nesting depth {} reached",
                    target, depth
                )
            }
            EngineWarning::DefinitionRejected { name, reason } => match reason {
                Rejection::Frozen => format!(
                    "Definition of '\\{}' ignored: the name was renamed with \\let",
                    name
                ),
                Rejection::ProtectedArity => format!(
                    "Definition of '\\{}' ignored: it would hide a reference command",
                    name
                ),
            },
            EngineWarning::ProofRedefinitionIgnored { name } => {
                format!("Redefinition of proof environment '{}' ignored", name)
            }
            EngineWarning::ExpansionFailed { name } => {
                format!(
                    "Use of '\\{}' does not match its definition; treated as a no-op",
                    name
                )
            }
        }
    }
}

impl std::fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

// ============================================================================
// Scan Frames
// ============================================================================

/// What ends the current call to [`Engine::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Closer {
    /// Top level: only the end of the file (or `\end{document}`)
    EndOfFile,
    /// `$...$`
    Dollar,
    /// `$$...$$`
    DoubleDollar,
    /// `\(...\)`
    Paren,
    /// `\[...\]`
    Bracket,
    /// `\begin{name}...\end{name}`
    Environment(String),
}

impl Closer {
    fn limit(&self, config: &ExtractOptions) -> Option<usize> {
        match self {
            Closer::EndOfFile => None,
            Closer::Dollar | Closer::DoubleDollar | Closer::Paren | Closer::Bracket => {
                Some(config.math_token_limit)
            }
            Closer::Environment(_) => Some(config.env_token_limit),
        }
    }

    fn runaway(&self, limit: usize) -> ExtractError {
        match self {
            Closer::Environment(name) => ExtractError::runaway_environment(name.clone(), limit),
            _ => ExtractError::RunawayMath { limit },
        }
    }

    fn is_math(&self) -> bool {
        matches!(
            self,
            Closer::Dollar | Closer::DoubleDollar | Closer::Paren | Closer::Bracket
        )
    }
}

/// How a scan step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// The frame's closer was found
    Close,
    /// `\end{document}` at top level
    EndDocument,
    /// The outermost proof closed; `None` when it collected nothing
    ProofCompleted(Option<Proof>),
}

// ============================================================================
// Engine Component Structures
// ============================================================================

/// Definitions and include stack; lives as long as the file.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pub macros: MacroTable,
    /// Paths of the files being read, outermost first.
    pub includes: Vec<String>,
}

/// Mode counters and the proof being collected.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Open math frames
    pub math_depth: usize,
    /// Open discarded-environment frames
    pub discard_depth: usize,
    /// Open proof environments
    pub proof_nesting: usize,
    /// Last visible math character was a period
    pub final_period: bool,
    pub accumulator: ProofAccumulator,
    /// Stream position where the outermost proof opened
    pub proof_started_at: usize,
    pub warnings: Vec<EngineWarning>,
}

impl ScanContext {
    pub fn push_warning(&mut self, warning: EngineWarning) {
        self.warnings.push(warning);
    }

    pub fn take_warnings(&mut self) -> Vec<EngineWarning> {
        std::mem::take(&mut self.warnings)
    }
}

// ============================================================================
// Main Engine Structure
// ============================================================================

/// The proof extraction engine for one top-level file.
///
/// Composed of:
/// - `config`: limits and resources shared by every file of a batch
/// - `state`: macro table and include stack
/// - `context`: mode counters and the proof accumulator
pub struct Engine<'a> {
    pub config: &'a ExtractOptions,
    pub(crate) resolver: &'a dyn FileResolver,
    pub(crate) stream: TokenStream,
    pub state: ScanState,
    pub context: ScanContext,
}

impl<'a> Engine<'a> {
    /// Prepare `source` (read from `path`) for scanning.
    pub fn new(
        source: &str,
        path: &str,
        config: &'a ExtractOptions,
        resolver: &'a dyn FileResolver,
    ) -> Self {
        let tokens = lex_source(source, path, &config.fixups);
        Engine {
            config,
            resolver,
            stream: TokenStream::new(tokens),
            state: ScanState {
                macros: MacroTable::new(),
                includes: vec![path.to_string()],
            },
            context: ScanContext::default(),
        }
    }

    /// Tokens consumed so far, re-scanned expansions included.
    pub fn tokens_consumed(&self) -> usize {
        self.stream.consumed()
    }

    pub(crate) fn in_math(&self) -> bool {
        self.context.math_depth > 0
    }

    pub(crate) fn in_proof(&self) -> bool {
        self.context.proof_nesting > 0
    }

    /// Inside a math or discarded-environment frame.
    pub(crate) fn in_skip_frame(&self) -> bool {
        self.context.math_depth > 0 || self.context.discard_depth > 0
    }

    pub(crate) fn warn(&mut self, warning: EngineWarning) {
        log::debug!("{}", warning);
        self.context.push_warning(warning);
    }

    /// End of input where an argument was expected: proof-local inside a
    /// proof, fatal elsewhere.
    pub(crate) fn eof_interrupt(&self, context: &str) -> Interrupt {
        if self.in_proof() {
            Interrupt::SkipProof(SkipReason::EndOfInput)
        } else {
            Interrupt::Fatal(ExtractError::unexpected_end(context))
        }
    }

    fn check_budget(&self, start: usize, closer: &Closer) -> ScanResult<()> {
        let consumed = self.stream.consumed();
        if consumed > self.config.file_token_limit {
            return Err(ExtractError::TokenBudgetExceeded {
                limit: self.config.file_token_limit,
            }
            .into());
        }
        if let Some(limit) = closer.limit(self.config) {
            if consumed - start > limit {
                return Err(closer.runaway(limit).into());
            }
        }
        if self.in_proof() && consumed - self.context.proof_started_at > self.config.env_token_limit
        {
            return Err(
                ExtractError::runaway_environment("proof", self.config.env_token_limit).into(),
            );
        }
        Ok(())
    }

    // ========================================================================
    // Main Loop
    // ========================================================================

    /// Interpret tokens until `closer` is found.
    pub(crate) fn scan(&mut self, closer: &Closer) -> ScanResult<Flow> {
        let start = self.stream.consumed();
        loop {
            self.check_budget(start, closer)?;
            let token = match self.stream.next() {
                Some(token) => token,
                None => return self.end_of_input(closer),
            };
            match token {
                TexToken::EndOfInput => self.leave_include(),
                TexToken::MathShift => {
                    match closer {
                        Closer::Dollar => return Ok(Flow::Close),
                        Closer::DoubleDollar => {
                            if matches!(self.stream.peek(), Some(TexToken::MathShift)) {
                                self.stream.next();
                            }
                            return Ok(Flow::Close);
                        }
                        _ => {}
                    }
                    if matches!(self.stream.peek(), Some(TexToken::MathShift)) {
                        self.stream.next();
                        self.skip_math(Closer::DoubleDollar)?;
                    } else {
                        self.skip_math(Closer::Dollar)?;
                    }
                }
                TexToken::ControlSeq(name) => match self.dispatch(&name, closer)? {
                    Flow::Continue => {}
                    flow => return Ok(flow),
                },
                TexToken::Char(c) => self.scan_char(c),
                TexToken::Space | TexToken::ActiveChar(_) => self.emit_space(),
                TexToken::AlignTab => {
                    if self.in_math() {
                        self.context.final_period = false;
                    }
                    self.emit_space();
                }
                TexToken::Superscript | TexToken::Subscript => {
                    if self.in_math() {
                        self.context.final_period = false;
                    } else {
                        let text = token.to_string();
                        self.math_only_in_text(&text)?;
                    }
                }
                TexToken::BeginGroup
                | TexToken::EndGroup
                | TexToken::Param(_)
                | TexToken::DeferredParam(_)
                | TexToken::Inert(_) => {}
            }
        }
    }

    fn end_of_input(&mut self, closer: &Closer) -> ScanResult<Flow> {
        match closer {
            Closer::EndOfFile => Ok(Flow::EndDocument),
            c if c.is_math() => Err(ExtractError::UnterminatedMath.into()),
            Closer::Environment(name) => {
                Err(ExtractError::unexpected_end(format!("environment '{}'", name)).into())
            }
            _ => Err(ExtractError::internal("unreachable closer").into()),
        }
    }

    /// A math-only construct in prose. Inside a proof this means a
    /// missing `$`, and the proof is dropped.
    pub(crate) fn math_only_in_text(&mut self, command: &str) -> ScanResult<()> {
        if self.capturing() {
            return Err(Interrupt::SkipProof(SkipReason::MathOutsideMath {
                command: command.to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::files::NoopFileResolver;

    fn engine<'a>(source: &str, options: &'a ExtractOptions) -> Engine<'a> {
        Engine::new(source, "test.tex", options, &NoopFileResolver)
    }

    #[test]
    fn test_warning_messages() {
        let warning = EngineWarning::IncludeMissing {
            target: "defs".into(),
            from: "main.tex".into(),
        };
        assert!(warning.message().contains("defs"));
        let warning = EngineWarning::DefinitionRejected {
            name: "ref".into(),
            reason: Rejection::ProtectedArity,
        };
        assert!(warning.to_string().contains("\\ref"));
    }

    #[test]
    fn test_scan_reaches_end_of_file() {
        let options = ExtractOptions::default();
        let mut e = engine("Some preamble text.", &options);
        assert_eq!(e.scan(&Closer::EndOfFile), Ok(Flow::EndDocument));
        assert!(e.tokens_consumed() > 0);
    }

    #[test]
    fn test_unterminated_math_is_fatal() {
        let options = ExtractOptions::default();
        let mut e = engine("$x + y", &options);
        assert_eq!(
            e.scan(&Closer::EndOfFile),
            Err(Interrupt::Fatal(ExtractError::UnterminatedMath))
        );
    }

    #[test]
    fn test_runaway_math_limit() {
        let options = ExtractOptions {
            math_token_limit: 10,
            ..ExtractOptions::default()
        };
        let mut e = engine("$a a a a a a a a a a a a a a a a$", &options);
        assert_eq!(
            e.scan(&Closer::EndOfFile),
            Err(Interrupt::Fatal(ExtractError::RunawayMath { limit: 10 }))
        );
    }

    #[test]
    fn test_file_budget() {
        let options = ExtractOptions {
            file_token_limit: 5,
            ..ExtractOptions::default()
        };
        let mut e = engine("one two three four", &options);
        assert_eq!(
            e.scan(&Closer::EndOfFile),
            Err(Interrupt::Fatal(ExtractError::TokenBudgetExceeded { limit: 5 }))
        );
    }

    #[test]
    fn test_end_document_inside_math_is_fatal() {
        let options = ExtractOptions::default();
        let mut e = engine("$x \\end{document}", &options);
        assert!(matches!(
            e.scan(&Closer::EndOfFile),
            Err(Interrupt::Fatal(ExtractError::UnexpectedEnd { .. }))
        ));
    }
}
