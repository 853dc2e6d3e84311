//! Command Dispatcher
//!
//! Lookup order for `\name`:
//!
//! 1. frame closers and structural commands (`\begin`, `\end`, `\fi`, ...)
//! 2. user macros, unless frozen
//! 3. tracked conditionals (`\iffoo`, `\footrue`) and primitive `\if...`
//! 4. the built-in command table
//!
//! Anything else is a no-op.

use super::skip::SkipKind;
use super::token::TexToken;
use super::{Closer, Engine, Flow};
use crate::data::accents::{apply_accent, special_letter};
use crate::data::commands::{effect_of, is_if_primitive, CommandEffect};
use crate::data::environments::{classify_environment, is_proof_environment, EnvironmentClass};
use crate::utils::error::{ExtractError, ScanResult};

/// Control sequences handled by the dispatcher itself rather than the
/// command table.
pub fn is_special(name: &str) -> bool {
    matches!(
        name,
        "begin"
            | "end"
            | "("
            | ")"
            | "["
            | "]"
            | "else"
            | "fi"
            | "or"
            | "proof"
            | "endproof"
            | "enddocument"
            | "bye"
            | "endinput"
            | "verb"
            | "csname"
            | "endcsname"
            | "string"
            | "meaning"
            | "the"
            | "noexpand"
            | "futurelet"
            | "expandafter"
            | "global"
            | "long"
            | "protected"
            | "outer"
            | "relax"
            | "makeatletter"
            | "makeatother"
            | "ExplSyntaxOn"
            | "ExplSyntaxOff"
    )
}

impl Engine<'_> {
    pub(crate) fn dispatch(&mut self, name: &str, closer: &Closer) -> ScanResult<Flow> {
        match (name, closer) {
            (")", Closer::Paren) | ("]", Closer::Bracket) => return Ok(Flow::Close),
            _ => {}
        }
        if is_special(name) {
            return self.dispatch_special(name, closer);
        }

        if let Some(def) = self.state.macros.lookup(name).cloned() {
            self.expand_macro(name, &def)?;
            return Ok(Flow::Continue);
        }
        if let Some((flag, value)) = self.state.macros.conditional_setter(name) {
            self.state.macros.set_conditional(&flag, value);
            return Ok(Flow::Continue);
        }
        if let Some(flag) = self.state.macros.conditional_for_if(name) {
            let truth = self.state.macros.conditional(flag).unwrap_or(false);
            self.begin_conditional(truth)?;
            return Ok(Flow::Continue);
        }
        if is_if_primitive(name) {
            self.primitive_conditional(name)?;
            return Ok(Flow::Continue);
        }

        match effect_of(name) {
            Some(effect) => self.apply_effect(name, effect)?,
            None => log::trace!("ignoring unknown command \\{}", name),
        }
        Ok(Flow::Continue)
    }

    fn dispatch_special(&mut self, name: &str, closer: &Closer) -> ScanResult<Flow> {
        match name {
            "begin" => return self.begin_environment(),
            "end" => return self.end_environment(closer),
            "(" => self.skip_math(Closer::Paren)?,
            "[" => self.skip_math(Closer::Bracket)?,
            "else" | "or" => self.skip_conditional(false)?,
            "proof" | "endproof" if self.in_skip_frame() => {
                self.stream.push_back_one(TexToken::ControlSeq(name.to_string()));
                return Ok(Flow::Close);
            }
            "proof" => self.open_proof()?,
            "endproof" => return Ok(self.close_proof()),
            "enddocument" | "bye" => return self.end_document(closer),
            "endinput" => self.end_input(),
            "verb" => self.skip_verb(),
            "csname" => self.build_csname(),
            "string" | "meaning" | "the" | "noexpand" | "futurelet" => {
                self.stream.next();
            }
            "ExplSyntaxOn" => self.skip_until_control_seq("ExplSyntaxOff"),
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn apply_effect(&mut self, name: &str, effect: CommandEffect) -> ScanResult<()> {
        match effect {
            CommandEffect::Silent(signature) => self.consume_signature(signature)?,
            CommandEffect::Placeholder(placeholder, signature) => {
                self.consume_signature(signature)?;
                self.emit_placeholder(placeholder);
            }
            CommandEffect::Literal(text) => self.emit_text(text),
            CommandEffect::Space(signature) => {
                self.consume_signature(signature)?;
                self.emit_space();
            }
            CommandEffect::Accent(mark) => {
                let base = self.accent_base()?;
                self.emit_owned(apply_accent(&base, mark));
            }
            CommandEffect::Definition(kind) => self.define(kind)?,
            CommandEffect::Conditional(kind) => self.package_conditional(kind)?,
            CommandEffect::Include(kind) => self.include(kind)?,
            CommandEffect::MathText => {
                if self.in_math() {
                    self.math_text()?;
                }
            }
            CommandEffect::MathOnly => {
                if !self.in_math() {
                    self.math_only_in_text(name)?;
                }
            }
        }
        Ok(())
    }

    /// The letter an accent applies to: `\'e`, `\'{e}`, `\"{\i}`.
    fn accent_base(&mut self) -> ScanResult<String> {
        let arg = self.get_arg()?;
        let mut base = String::new();
        for token in arg.as_slice() {
            match token {
                TexToken::Char(c) => base.push(*c),
                TexToken::ControlSeq(name) => {
                    if let Some(letter) = special_letter(name) {
                        base.push_str(letter);
                    }
                }
                _ => {}
            }
        }
        Ok(base)
    }

    fn end_document(&mut self, closer: &Closer) -> ScanResult<Flow> {
        if *closer == Closer::EndOfFile {
            return Ok(Flow::EndDocument);
        }
        Err(ExtractError::unexpected_end("\\end{document} inside math or an environment").into())
    }

    // ========================================================================
    // Environments
    // ========================================================================

    fn environment_name(&mut self) -> ScanResult<String> {
        Ok(self.get_arg()?.to_plain_text())
    }

    fn begin_environment(&mut self) -> ScanResult<Flow> {
        let name = self.environment_name()?;
        if name.is_empty() {
            return Ok(Flow::Continue);
        }
        let class = classify_environment(&name);
        if class == EnvironmentClass::Proof {
            if self.in_skip_frame() {
                // A proof can only start in prose: the open math or
                // discarded environment was never closed.
                self.push_back_environment("begin", &name);
                return Ok(Flow::Close);
            }
            self.open_proof()?;
            return Ok(Flow::Continue);
        }

        if let Some(env) = self.state.macros.environment(&name).cloned() {
            self.expand_macro(&name, &env.begin)?;
            return Ok(Flow::Continue);
        }
        match class {
            EnvironmentClass::Math => self.skip_environment(&name, SkipKind::Math)?,
            EnvironmentClass::Delete => self.skip_environment(&name, SkipKind::Delete)?,
            EnvironmentClass::Verbatim => self.skip_verbatim(&name)?,
            EnvironmentClass::Transparent(signature) => self.consume_signature(signature)?,
            EnvironmentClass::Proof => {}
        }
        Ok(Flow::Continue)
    }

    fn end_environment(&mut self, closer: &Closer) -> ScanResult<Flow> {
        let name = self.environment_name()?;
        if let Closer::Environment(open) = closer {
            if *open == name {
                return Ok(Flow::Close);
            }
        }
        if is_proof_environment(&name) {
            if self.in_skip_frame() {
                self.push_back_environment("end", &name);
                return Ok(Flow::Close);
            }
            return Ok(self.close_proof());
        }
        if name == "document" {
            return self.end_document(closer);
        }
        if let Some(env) = self.state.macros.environment(&name) {
            let end = env.end.clone().into_inner();
            self.stream.push_back(end);
        }
        Ok(Flow::Continue)
    }

    /// Put `\begin{name}` or `\end{name}` back on the stream.
    fn push_back_environment(&mut self, command: &str, name: &str) {
        let mut tokens = Vec::with_capacity(name.len() + 3);
        tokens.push(TexToken::ControlSeq(command.to_string()));
        tokens.push(TexToken::BeginGroup);
        tokens.extend(name.chars().map(TexToken::Char));
        tokens.push(TexToken::EndGroup);
        self.stream.push_back(tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ExtractOptions;
    use crate::utils::error::{Interrupt, SkipReason};
    use crate::utils::files::NoopFileResolver;
    use pretty_assertions::assert_eq;

    /// Scan `source` as the body of an open proof and return what was
    /// collected.
    fn collect(source: &str) -> String {
        let options = ExtractOptions::default();
        let mut engine = Engine::new(source, "test.tex", &options, &NoopFileResolver);
        engine.context.proof_nesting = 1;
        engine.scan(&Closer::EndOfFile).unwrap();
        engine.context.accumulator.render()
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(collect("by \\cite[p.~3]{a,b} and \\eqref{e}"), "by CITE and REF");
        assert_eq!(collect("\\item First"), "CASE: First");
    }

    #[test]
    fn test_silent_commands_drop_arguments() {
        assert_eq!(collect("done\\footnote{aside}\\label{x}"), "done");
    }

    #[test]
    fn test_literals_and_accents() {
        assert_eq!(collect("Erd\\H{o}s and G\\\"odel"), "Erdo\u{30b}s and Go\u{308}del");
        assert_eq!(collect("\\ldots"), "...");
    }

    #[test]
    fn test_unknown_command_is_no_op() {
        assert_eq!(collect("a \\mysterycommand b"), "a b");
    }

    #[test]
    fn test_math_only_in_prose_skips_proof() {
        let options = ExtractOptions::default();
        let mut engine = Engine::new("a \\alpha b", "test.tex", &options, &NoopFileResolver);
        engine.context.proof_nesting = 1;
        assert_eq!(
            engine.scan(&Closer::EndOfFile),
            Err(Interrupt::SkipProof(SkipReason::MathOutsideMath {
                command: "alpha".into()
            }))
        );
    }

    #[test]
    fn test_math_only_outside_proof_is_ignored() {
        let options = ExtractOptions::default();
        let mut engine = Engine::new("a \\alpha b", "test.tex", &options, &NoopFileResolver);
        assert_eq!(engine.scan(&Closer::EndOfFile), Ok(Flow::EndDocument));
    }

    #[test]
    fn test_discarded_environment() {
        assert_eq!(
            collect("a \\begin{figure}\\caption{c} $x$ text\\end{figure} b"),
            "a b"
        );
    }

    #[test]
    fn test_verbatim_environment() {
        assert_eq!(collect("a \\begin{verbatim}$ \\alpha\\end{verbatim} b"), "a b");
    }

    #[test]
    fn test_user_environment() {
        assert_eq!(
            collect("\\newenvironment{claim}{Claim:}{End.}\\begin{claim} x \\end{claim}"),
            "Claim: x End ."
        );
    }

    #[test]
    fn test_flag_conditionals() {
        assert_eq!(collect("\\newif\\ifdraft \\drafttrue \\ifdraft D\\else F\\fi"), "D");
        assert_eq!(collect("\\newif\\ifdraft \\ifdraft D\\else F\\fi"), "F");
    }

    #[test]
    fn test_explsyntax_block_skipped() {
        assert_eq!(collect("a \\ExplSyntaxOn \\cs_new:Npn \\ExplSyntaxOff b"), "a b");
    }

    #[test]
    fn test_proof_inside_math_closes_math() {
        let options = ExtractOptions::default();
        let mut engine = Engine::new(
            "$x \\begin{proof} y \\end{proof}",
            "test.tex",
            &options,
            &NoopFileResolver,
        );
        let flow = engine.scan(&Closer::EndOfFile).unwrap();
        assert!(matches!(flow, Flow::ProofCompleted(Some(_))));
    }

    #[test]
    fn test_is_special() {
        assert!(is_special("begin"));
        assert!(is_special("relax"));
        assert!(!is_special("section"));
    }
}
