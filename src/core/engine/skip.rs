//! Math/Environment Skipper
//!
//! Math and discarded environments are scanned as nested frames, so
//! definitions and conditionals inside them still take effect while
//! nothing is emitted. Verbatim-like content is skipped raw.

use super::token::TexToken;
use super::{Closer, Engine};
use crate::data::commands::Placeholder;
use crate::utils::error::{ExtractError, ScanResult};

/// Upper bound for `\verb` content and `\csname` names.
const MAX_INLINE_TOKENS: usize = 1_000;

/// What a skipped environment stands for in the proof text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipKind {
    Math,
    Delete,
}

impl Engine<'_> {
    /// Skip a math span opened by `$`, `$$`, `\(` or `\[`.
    pub(crate) fn skip_math(&mut self, closer: Closer) -> ScanResult<()> {
        self.check_skip_depth()?;
        self.enter_math();
        let result = self.scan(&closer);
        self.context.math_depth -= 1;
        result?;
        self.after_math();
        Ok(())
    }

    /// Skip `\begin{name}...\end{name}`; the `\begin{name}` is consumed.
    pub(crate) fn skip_environment(&mut self, name: &str, kind: SkipKind) -> ScanResult<()> {
        self.check_skip_depth()?;
        match kind {
            SkipKind::Math => self.enter_math(),
            SkipKind::Delete => self.context.discard_depth += 1,
        }
        let result = self.scan(&Closer::Environment(name.to_string()));
        match kind {
            SkipKind::Math => self.context.math_depth -= 1,
            SkipKind::Delete => self.context.discard_depth -= 1,
        }
        result?;
        if kind == SkipKind::Math {
            self.after_math();
        }
        Ok(())
    }

    /// Every skip frame is a nested `scan`, so the depth is bounded.
    fn check_skip_depth(&self) -> ScanResult<()> {
        let limit = self.config.max_skip_depth;
        if self.context.math_depth + self.context.discard_depth >= limit {
            return Err(ExtractError::NestingTooDeep { limit }.into());
        }
        Ok(())
    }

    fn enter_math(&mut self) {
        if self.context.math_depth == 0 {
            self.context.final_period = false;
        }
        self.context.math_depth += 1;
    }

    /// One placeholder for the span, and the sentence end it carried.
    fn after_math(&mut self) {
        if self.capturing() {
            self.emit_placeholder(Placeholder::Math);
            if self.context.final_period {
                self.emit_text(" .");
            }
        }
    }

    /// `\text{...}` inside math: read raw; a trailing period ends the
    /// sentence the math belongs to.
    pub(crate) fn math_text(&mut self) -> ScanResult<()> {
        let arg = self.get_arg()?;
        let last = arg.as_slice().iter().rev().find(|t| {
            !matches!(
                t,
                TexToken::Space
                    | TexToken::BeginGroup
                    | TexToken::EndGroup
                    | TexToken::ControlSeq(_)
                    | TexToken::Inert(_)
            )
        });
        match last {
            Some(TexToken::Char('.')) => self.context.final_period = true,
            Some(_) => self.context.final_period = false,
            None => {}
        }
        Ok(())
    }

    /// Skip raw tokens up to `\end{name}`.
    pub(crate) fn skip_verbatim(&mut self, name: &str) -> ScanResult<()> {
        let start = self.stream.consumed();
        let limit = self.config.env_token_limit;
        loop {
            if self.stream.consumed() - start > limit {
                return Err(ExtractError::runaway_environment(name, limit).into());
            }
            match self.stream.next() {
                None => {
                    return Err(
                        ExtractError::unexpected_end(format!("environment '{}'", name)).into(),
                    )
                }
                Some(TexToken::ControlSeq(cs)) if cs == "end" => {
                    if let Some((found, span)) = self.stream.peek_group_name(0) {
                        if found == name {
                            self.stream.skip_tokens(span);
                            return Ok(());
                        }
                    }
                }
                Some(TexToken::EndOfInput) => self.leave_include(),
                Some(_) => {}
            }
        }
    }

    /// Skip raw tokens up to the control sequence `until`; the whole input
    /// when it never comes.
    pub(crate) fn skip_until_control_seq(&mut self, until: &str) {
        while let Some(token) = self.stream.next() {
            match token {
                TexToken::ControlSeq(cs) if cs == until => return,
                TexToken::EndOfInput => self.leave_include(),
                _ => {}
            }
        }
    }

    /// `\endinput`: the rest of the current file is ignored.
    pub(crate) fn end_input(&mut self) {
        while let Some(token) = self.stream.next() {
            if token == TexToken::EndOfInput {
                self.leave_include();
                return;
            }
        }
    }

    /// `\verb|...|` and `\verb*|...|`.
    pub(crate) fn skip_verb(&mut self) {
        self.consume_star();
        let delimiter = match self.stream.next() {
            Some(TexToken::Char(c)) => c,
            _ => return,
        };
        for _ in 0..MAX_INLINE_TOKENS {
            match self.stream.next() {
                Some(TexToken::Char(c)) if c == delimiter => return,
                Some(_) => {}
                None => return,
            }
        }
    }

    /// `\csname name\endcsname` becomes the control sequence `\name`.
    pub(crate) fn build_csname(&mut self) {
        let mut collected = Vec::new();
        while collected.len() < MAX_INLINE_TOKENS {
            match self.stream.next() {
                Some(TexToken::ControlSeq(cs)) if cs == "endcsname" => {
                    let name: String = collected.iter().map(TexToken::to_string).collect();
                    self.stream
                        .push_back_one(TexToken::ControlSeq(name.trim().to_string()));
                    return;
                }
                Some(token) => collected.push(token),
                None => break,
            }
        }
        self.stream.push_back(collected);
    }
}
