//! Conditionals
//!
//! Primitive `\if...` tests are decided without evaluating their
//! operands: only `\iftrue` and `\ifdefined\hyperref` hold. Flags declared
//! with `\newif`, `\newboolean` or `\newtoggle` are tracked, so
//! `\iffoo`, `\ifbool{foo}` and `\ifthenelse{\boolean{foo}}` follow the
//! document's own settings.

use super::args::read_group;
use super::definitions::is_builtin;
use super::stream::TokenStream;
use super::token::{TexToken, TokenList};
use super::Engine;
use crate::data::commands::{is_if_primitive, ConditionalKind};
use crate::utils::error::{ExtractError, ScanResult};

/// Control sequences whose next token is a name being defined, never a
/// conditional being opened.
const DEFINERS: &[&str] = &["newif", "def", "gdef", "edef", "xdef", "let"];

impl Engine<'_> {
    /// A primitive `\if...`.
    pub(crate) fn primitive_conditional(&mut self, name: &str) -> ScanResult<()> {
        let truth = match name {
            "iftrue" => true,
            "ifdefined" => {
                self.stream.skip_spaces();
                let hyperref = matches!(self.stream.peek(), Some(t) if t.is_cs("hyperref"));
                if hyperref {
                    self.stream.next();
                }
                hyperref
            }
            _ => false,
        };
        self.begin_conditional(truth)
    }

    /// Enter a conditional: a true one continues into its first branch, a
    /// false one skips to just after its `\else` or `\fi`.
    pub(crate) fn begin_conditional(&mut self, truth: bool) -> ScanResult<()> {
        if !truth {
            self.skip_conditional(true)?;
        }
        Ok(())
    }

    /// Skip raw tokens to the matching `\fi` (or `\else`, with
    /// `stop_at_else`). Nested conditionals are counted.
    pub(crate) fn skip_conditional(&mut self, stop_at_else: bool) -> ScanResult<()> {
        let start = self.stream.consumed();
        let limit = self.config.conditional_token_limit;
        let mut depth = 0usize;
        loop {
            if self.stream.consumed() - start > limit {
                return Err(ExtractError::RunawayConditional { limit }.into());
            }
            let token = match self.stream.next() {
                Some(token) => token,
                None => return Err(ExtractError::unexpected_end("conditional").into()),
            };
            let name = match token {
                TexToken::ControlSeq(name) => name,
                TexToken::EndOfInput => {
                    self.leave_include();
                    continue;
                }
                _ => continue,
            };
            match name.as_str() {
                "fi" if depth == 0 => return Ok(()),
                "fi" => depth -= 1,
                "else" if depth == 0 && stop_at_else => return Ok(()),
                n if DEFINERS.contains(&n) => {
                    self.stream.next();
                }
                n if self.opens_conditional(n) => depth += 1,
                _ => {}
            }
        }
    }

    /// Whether `\name` opens a conditional that needs a `\fi`: a tracked
    /// flag, or an `\if...` primitive the document has not redefined.
    pub(crate) fn opens_conditional(&self, name: &str) -> bool {
        self.state.macros.conditional_for_if(name).is_some()
            || (is_if_primitive(name) && self.state.macros.lookup(name).is_none())
    }

    /// `ifthen`, `etoolbox` and `xstring` tests and flag setters.
    pub(crate) fn package_conditional(&mut self, kind: ConditionalKind) -> ScanResult<()> {
        match kind {
            ConditionalKind::IfThenElse => {
                let condition = self.get_arg()?;
                let truth = self.evaluate_condition(condition);
                self.choose_branch(truth)?;
            }
            ConditionalKind::IfStrEqual => {
                self.consume_star();
                let left = self.get_arg()?.to_plain_text();
                let right = self.get_arg()?.to_plain_text();
                self.choose_branch(left == right)?;
            }
            ConditionalKind::IfStrEmpty => {
                let value = self.get_arg()?.to_plain_text();
                self.choose_branch(value.is_empty())?;
            }
            ConditionalKind::IfBool => {
                let flag = self.get_arg()?.to_plain_text();
                let truth = self.state.macros.conditional(&flag).unwrap_or(false);
                self.choose_branch(truth)?;
            }
            ConditionalKind::SetBoolean => {
                let flag = self.get_arg()?.to_plain_text();
                let value = self.get_arg()?.to_plain_text();
                self.set_flag(&flag, value.eq_ignore_ascii_case("true"));
            }
            ConditionalKind::SetFlag(value) => {
                let flag = self.get_arg()?.to_plain_text();
                self.set_flag(&flag, value);
            }
            ConditionalKind::IfDefined { by_name, defined } => {
                let operand = self.get_arg()?;
                let name = if by_name {
                    Some(operand.to_plain_text())
                } else {
                    operand.first_control_seq().map(str::to_string)
                };
                let found = name.is_some_and(|name| self.is_command_defined(&name));
                self.choose_branch(found == defined)?;
            }
            ConditionalKind::Untested(signature) => {
                self.consume_signature(signature)?;
                self.choose_branch(false)?;
            }
        }
        Ok(())
    }

    fn is_command_defined(&self, name: &str) -> bool {
        !name.is_empty() && (self.state.macros.is_defined(name) || is_builtin(name))
    }

    pub(crate) fn set_flag(&mut self, flag: &str, value: bool) {
        if flag.is_empty() {
            return;
        }
        self.state.macros.declare_conditional(flag);
        self.state.macros.set_conditional(flag, value);
    }

    /// Read `{true}{false}` and re-scan the chosen branch.
    fn choose_branch(&mut self, truth: bool) -> ScanResult<()> {
        let on_true = self.get_arg()?;
        let on_false = self.get_arg()?;
        let chosen = if truth { on_true } else { on_false };
        self.stream.push_back(chosen.into_inner());
        Ok(())
    }

    /// Evaluate an `\ifthenelse` condition: `\equal`, `\boolean`,
    /// `\isundefined`, combined left to right with `\not`, `\and`, `\or`.
    fn evaluate_condition(&self, condition: TokenList) -> bool {
        let mut stream = TokenStream::new(condition);
        let mut result: Option<bool> = None;
        let mut conjunction = true;
        let mut negate = false;
        while let Some(token) = stream.next() {
            let name = match token {
                TexToken::ControlSeq(name) => name,
                _ => continue,
            };
            let value = match name.as_str() {
                "not" | "NOT" => {
                    negate = !negate;
                    continue;
                }
                "and" | "AND" => {
                    conjunction = true;
                    continue;
                }
                "or" | "OR" => {
                    conjunction = false;
                    continue;
                }
                "equal" => {
                    let left = read_group(&mut stream).to_plain_text();
                    let right = read_group(&mut stream).to_plain_text();
                    left == right
                }
                "boolean" => {
                    let flag = read_group(&mut stream).to_plain_text();
                    self.state.macros.conditional(&flag).unwrap_or(false)
                }
                "isundefined" => {
                    let target = read_group(&mut stream);
                    target
                        .first_control_seq()
                        .map_or(true, |cs| !self.state.macros.is_defined(cs))
                }
                _ => false,
            };
            let value = value != negate;
            negate = false;
            result = Some(match result {
                None => value,
                Some(previous) if conjunction => previous && value,
                Some(previous) => previous || value,
            });
        }
        result.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ExtractOptions;
    use crate::core::engine::macros::MacroDef;
    use crate::utils::error::Interrupt;
    use crate::utils::files::NoopFileResolver;
    use pretty_assertions::assert_eq;

    fn with_engine<T>(source: &str, f: impl FnOnce(&mut Engine<'_>) -> T) -> T {
        let options = ExtractOptions::default();
        let mut engine = Engine::new(source, "test.tex", &options, &NoopFileResolver);
        f(&mut engine)
    }

    fn rest(engine: &mut Engine<'_>) -> String {
        let tokens: Vec<_> = std::iter::from_fn(|| engine.stream.next()).collect();
        TokenList::from_vec(tokens).to_string()
    }

    #[test]
    fn test_false_branch_skips_nested() {
        with_engine("a \\ifx b\\fi c \\else d\\fi e", |e| {
            e.begin_conditional(false).unwrap();
            assert_eq!(rest(e), "d\\fie");
        });
    }

    #[test]
    fn test_skip_ignores_defined_names() {
        with_engine("\\newif\\ifdraft \\def\\iffoo{} x\\fi y", |e| {
            e.skip_conditional(false).unwrap();
            assert_eq!(rest(e), "y");
        });
    }

    #[test]
    fn test_missing_fi_is_fatal() {
        with_engine("no end here", |e| {
            assert!(matches!(
                e.skip_conditional(false),
                Err(Interrupt::Fatal(ExtractError::UnexpectedEnd { .. }))
            ));
        });
    }

    #[test]
    fn test_runaway_conditional() {
        let options = ExtractOptions {
            conditional_token_limit: 3,
            ..ExtractOptions::default()
        };
        let mut e = Engine::new("a b c d e f \\fi", "t.tex", &options, &NoopFileResolver);
        assert_eq!(
            e.skip_conditional(false),
            Err(Interrupt::Fatal(ExtractError::RunawayConditional { limit: 3 }))
        );
    }

    #[test]
    fn test_ifdefined_hyperref() {
        with_engine("\\hyperref yes\\else no\\fi", |e| {
            e.primitive_conditional("ifdefined").unwrap();
            assert_eq!(rest(e), "yes\\elseno\\fi");
        });
        with_engine("\\foo yes\\else no\\fi", |e| {
            e.primitive_conditional("ifdefined").unwrap();
            assert_eq!(rest(e), "no\\fi");
        });
    }

    #[test]
    fn test_ifstrequal_and_ifbool() {
        with_engine("{a}{a}{T}{F}", |e| {
            e.package_conditional(ConditionalKind::IfStrEqual).unwrap();
            assert_eq!(rest(e), "T");
        });
        with_engine("{draft}{T}{F}", |e| {
            e.set_flag("draft", true);
            e.package_conditional(ConditionalKind::IfBool).unwrap();
            assert_eq!(rest(e), "T");
        });
        with_engine("{ }{T}{F}", |e| {
            e.package_conditional(ConditionalKind::IfStrEmpty).unwrap();
            assert_eq!(rest(e), "T");
        });
    }

    #[test]
    fn test_ifthenelse_conditions() {
        with_engine("{\\equal{a}{b} \\or \\not\\boolean{final}}{T}{F}", |e| {
            e.package_conditional(ConditionalKind::IfThenElse).unwrap();
            assert_eq!(rest(e), "T");
        });
        with_engine("{\\boolean{final}}{T}{F}", |e| {
            e.package_conditional(ConditionalKind::IfThenElse).unwrap();
            assert_eq!(rest(e), "F");
        });
    }

    #[test]
    fn test_setboolean() {
        with_engine("{final}{true}", |e| {
            e.package_conditional(ConditionalKind::SetBoolean).unwrap();
            assert_eq!(e.state.macros.conditional("final"), Some(true));
        });
    }

    #[test]
    fn test_skip_counts_unknown_if_words() {
        with_engine("\\ifCLASSOPTIONcompsoc A \\fi B \\fi after", |e| {
            e.skip_conditional(false).unwrap();
            assert_eq!(rest(e), "after");
        });
        with_engine("\\ifwide x\\fi after", |e| {
            e.state.macros.define("ifwide", MacroDef::simple(0, TokenList::new())).unwrap();
            e.skip_conditional(false).unwrap();
            assert_eq!(rest(e), "after");
        });
    }

    #[test]
    fn test_etoolbox_definedness() {
        with_engine("{\\qed}{yes}{no}", |e| {
            e.state.macros.define("qed", MacroDef::simple(0, TokenList::new())).unwrap();
            let kind = ConditionalKind::IfDefined {
                by_name: false,
                defined: true,
            };
            e.package_conditional(kind).unwrap();
            assert_eq!(rest(e), "yes");
        });
        with_engine("{nosuchthing}{yes}{no}", |e| {
            let kind = ConditionalKind::IfDefined {
                by_name: true,
                defined: false,
            };
            e.package_conditional(kind).unwrap();
            assert_eq!(rest(e), "yes");
        });
        with_engine("{1}{<}{2}{yes}{no}", |e| {
            e.package_conditional(ConditionalKind::Untested("mmm")).unwrap();
            assert_eq!(rest(e), "no");
        });
    }
}
