//! Proof Collector
//!
//! Text inside proof environments is collected as fragments and joined
//! when the outermost proof closes. A proof that hits a proof-local
//! failure is dropped and scanning resumes after its `\end{proof}`.

use crate::core::engine::{Closer, Engine, EngineWarning, Flow, TexToken};
use crate::data::commands::Placeholder;
use crate::data::environments::is_proof_environment;
use crate::utils::error::{ExtractResult, Interrupt, ScanResult, SkipReason};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// One extracted proof, whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proof {
    pub text: String,
}

impl Proof {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A piece of collected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Char(char),
    Text(Cow<'static, str>),
    Space,
    Placeholder(Placeholder),
}

/// Fragments of the proof being collected.
#[derive(Debug, Clone, Default)]
pub struct ProofAccumulator {
    fragments: Vec<Fragment>,
}

impl ProofAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: Fragment) {
        if fragment == Fragment::Space && self.fragments.last() == Some(&Fragment::Space) {
            return;
        }
        self.fragments.push(fragment);
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Math immediately followed by a word gap.
    fn ends_with_math_gap(&self) -> bool {
        matches!(
            self.fragments.as_slice(),
            [.., Fragment::Placeholder(Placeholder::Math), Fragment::Space]
        )
    }

    /// Joined text with whitespace collapsed and trimmed. Placeholders are
    /// separated from their neighbours by a space.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Char(c) => out.push(*c),
                Fragment::Text(text) => out.push_str(text),
                Fragment::Space => out.push(' '),
                Fragment::Placeholder(placeholder) => {
                    out.push(' ');
                    out.push_str(placeholder.as_str());
                    out.push(' ');
                }
            }
        }
        WHITESPACE.replace_all(&out, " ").trim().to_string()
    }

    /// Render and reset. Empty proofs yield `None`; a proof whose text
    /// ends in a letter gets a closing ` .`.
    pub fn finish(&mut self) -> Option<Proof> {
        let mut text = self.render();
        self.clear();
        if text.is_empty() {
            return None;
        }
        if text.chars().last().is_some_and(char::is_alphabetic) {
            text.push_str(" .");
        }
        Some(Proof { text })
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileProofs {
    pub proofs: Vec<Proof>,
    /// Why each dropped proof was dropped, in order
    pub skipped: Vec<SkipReason>,
    pub warnings: Vec<EngineWarning>,
    pub tokens_consumed: usize,
}

/// What one step of collection produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    Completed(Proof),
    Skipped(SkipReason),
}

impl Engine<'_> {
    // ========================================================================
    // Emission
    // ========================================================================

    /// Text is kept only inside a proof and outside math and discarded
    /// environments.
    pub(crate) fn capturing(&self) -> bool {
        self.context.proof_nesting > 0
            && self.context.math_depth == 0
            && self.context.discard_depth == 0
    }

    fn emit(&mut self, fragment: Fragment) {
        if self.capturing() {
            self.context.accumulator.push(fragment);
        }
    }

    pub(crate) fn emit_space(&mut self) {
        self.emit(Fragment::Space);
    }

    pub(crate) fn emit_text(&mut self, text: &'static str) {
        self.emit(Fragment::Text(Cow::Borrowed(text)));
    }

    pub(crate) fn emit_owned(&mut self, text: String) {
        if !text.is_empty() {
            self.emit(Fragment::Text(Cow::Owned(text)));
        }
    }

    pub(crate) fn emit_placeholder(&mut self, placeholder: Placeholder) {
        self.emit(Fragment::Placeholder(placeholder));
    }

    /// A character token. In math it only feeds the final-period rule.
    pub(crate) fn scan_char(&mut self, c: char) {
        if self.in_math() {
            self.context.final_period = c == '.';
            return;
        }
        if !self.capturing() {
            return;
        }
        let next_is_alphanumeric = self.stream.peek().is_some_and(TexToken::is_alphanumeric);
        if c == '.' {
            if next_is_alphanumeric {
                self.emit(Fragment::Char('.'));
            } else {
                self.emit_text(" .");
            }
            return;
        }
        // `$x$ Then we` reads as two sentences
        if c.is_uppercase()
            && self.context.accumulator.ends_with_math_gap()
            && self.stream.peek().is_some_and(TexToken::is_lowercase_letter)
        {
            self.emit_text(". ");
        }
        self.emit(Fragment::Char(c));
    }

    // ========================================================================
    // Proof Boundaries
    // ========================================================================

    /// `\begin{proof}[title]`, with the name already consumed.
    pub(crate) fn open_proof(&mut self) -> ScanResult<()> {
        self.get_optional()?;
        if self.context.proof_nesting == 0 {
            self.context.accumulator.clear();
            self.context.final_period = false;
            self.context.proof_started_at = self.stream.consumed();
        }
        self.context.proof_nesting += 1;
        Ok(())
    }

    /// `\end{proof}`; completes the proof when the outermost one closes.
    pub(crate) fn close_proof(&mut self) -> Flow {
        match self.context.proof_nesting {
            0 => Flow::Continue,
            1 => {
                self.context.proof_nesting = 0;
                Flow::ProofCompleted(self.context.accumulator.finish())
            }
            _ => {
                self.context.proof_nesting -= 1;
                Flow::Continue
            }
        }
    }

    /// Drop the current proof: reset all modes and skip raw tokens to the
    /// `\end{proof}` that closes it.
    fn abandon_proof(&mut self) {
        self.context.math_depth = 0;
        self.context.discard_depth = 0;
        self.context.final_period = false;
        self.context.accumulator.clear();
        while self.context.proof_nesting > 0 {
            let token = match self.stream.next() {
                Some(token) => token,
                None => {
                    self.context.proof_nesting = 0;
                    break;
                }
            };
            match token {
                TexToken::EndOfInput => self.leave_include(),
                TexToken::ControlSeq(cs) if cs == "begin" || cs == "end" => {
                    if let Some((name, span)) = self.stream.peek_group_name(0) {
                        if is_proof_environment(&name) {
                            self.stream.skip_tokens(span);
                            if cs == "begin" {
                                self.context.proof_nesting += 1;
                            } else {
                                self.context.proof_nesting -= 1;
                            }
                        }
                    }
                }
                TexToken::ControlSeq(cs) if cs == "endproof" => {
                    self.context.proof_nesting -= 1;
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Scan to the next completed or dropped proof; `None` at the end of
    /// the file. A file-local failure ends the file with an error.
    pub fn next_outcome(&mut self) -> ExtractResult<Option<ProofOutcome>> {
        loop {
            match self.scan(&Closer::EndOfFile) {
                Ok(Flow::ProofCompleted(Some(proof))) => {
                    return Ok(Some(ProofOutcome::Completed(proof)))
                }
                Ok(Flow::ProofCompleted(None)) | Ok(Flow::Continue) => continue,
                Ok(Flow::Close) | Ok(Flow::EndDocument) => {
                    // Anything after `\end{document}` is never read
                    while self.stream.next().is_some() {}
                    return Ok(None);
                }
                Err(Interrupt::SkipProof(reason)) => {
                    let file = self.state.includes.last().cloned().unwrap_or_default();
                    log::info!("{}: skipping proof: {}", file, reason);
                    self.abandon_proof();
                    return Ok(Some(ProofOutcome::Skipped(reason)));
                }
                Err(Interrupt::Fatal(err)) => return Err(err),
            }
        }
    }

    /// Collect every proof of the file.
    pub fn run(mut self) -> ExtractResult<FileProofs> {
        let mut result = FileProofs::default();
        while let Some(outcome) = self.next_outcome()? {
            match outcome {
                ProofOutcome::Completed(proof) => result.proofs.push(proof),
                ProofOutcome::Skipped(reason) => result.skipped.push(reason),
            }
        }
        result.warnings = self.context.take_warnings();
        result.tokens_consumed = self.stream.consumed();
        Ok(result)
    }

    /// Interpret the whole input as the body of one proof and return the
    /// collected text without the closing-period rule. A proof-local
    /// failure yields an empty string.
    pub fn render_body(mut self) -> ExtractResult<String> {
        self.context.proof_nesting = 1;
        self.context.proof_started_at = 0;
        loop {
            match self.scan(&Closer::EndOfFile) {
                Ok(Flow::ProofCompleted(_)) => {
                    self.context.proof_nesting = 1;
                    self.context.proof_started_at = self.stream.consumed();
                }
                Ok(_) => break,
                Err(Interrupt::SkipProof(_)) => return Ok(String::new()),
                Err(Interrupt::Fatal(err)) => return Err(err),
            }
        }
        Ok(self.context.accumulator.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ExtractOptions;
    use crate::utils::files::NoopFileResolver;
    use pretty_assertions::assert_eq;

    fn proofs(source: &str) -> Vec<String> {
        let options = ExtractOptions::default();
        let engine = Engine::new(source, "test.tex", &options, &NoopFileResolver);
        let result = engine.run().unwrap();
        result.proofs.into_iter().map(|p| p.text).collect()
    }

    fn body(source: &str) -> String {
        let options = ExtractOptions::default();
        Engine::new(source, "test.tex", &options, &NoopFileResolver)
            .render_body()
            .unwrap()
    }

    #[test]
    fn test_accumulator_render() {
        let mut acc = ProofAccumulator::new();
        acc.push(Fragment::Char('a'));
        acc.push(Fragment::Space);
        acc.push(Fragment::Space);
        acc.push(Fragment::Placeholder(Placeholder::Math));
        acc.push(Fragment::Text(Cow::Borrowed(" .")));
        assert_eq!(acc.render(), "a MATH .");
        assert_eq!(acc.finish(), Some(Proof { text: "a MATH .".into() }));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_finish_appends_period_after_letter() {
        let mut acc = ProofAccumulator::new();
        acc.push(Fragment::Placeholder(Placeholder::Ref));
        assert_eq!(acc.finish().unwrap().text, "REF .");
        assert_eq!(acc.finish(), None);
    }

    #[test]
    fn test_minimal_proof() {
        assert_eq!(
            proofs("\\begin{proof}Let $x$ be given.\\end{proof}"),
            vec!["Let MATH be given ."]
        );
    }

    #[test]
    fn test_final_period_inside_math() {
        assert_eq!(body("$x+y.$ Next"), "MATH . Next");
        assert_eq!(body("$x+y$. Next"), "MATH . Next");
    }

    #[test]
    fn test_implicit_period_after_math() {
        assert_eq!(
            proofs("\\begin{proof}\\begin{equation}x\\end{equation} Then done.\\end{proof}"),
            vec!["MATH . Then done ."]
        );
        assert_eq!(body("$x$ Then"), "MATH . Then");
        assert_eq!(body("$x$ A is"), "MATH A is");
    }

    #[test]
    fn test_period_before_letter() {
        assert_eq!(body("i.e. this"), "i.e . this");
    }

    #[test]
    fn test_text_outside_proofs_is_ignored() {
        assert_eq!(
            proofs("Intro. \\begin{theorem}T\\end{theorem}\\begin{proof}P\\end{proof} Outro"),
            vec!["P ."]
        );
    }

    #[test]
    fn test_nested_proofs_form_one() {
        assert_eq!(
            proofs("\\begin{proof}A \\begin{proof}B\\end{proof} C\\end{proof}"),
            vec!["A B C ."]
        );
    }

    #[test]
    fn test_empty_proof_dropped() {
        assert_eq!(proofs("\\begin{proof}\\label{p}\\end{proof}"), Vec::<String>::new());
    }

    #[test]
    fn test_failure_containment() {
        let source = "\\begin{proof}First.\\end{proof}\
                      \\begin{proof}Broken \\alpha here.\\end{proof}\
                      \\begin{proof}Third.\\end{proof}";
        let options = ExtractOptions::default();
        let result = Engine::new(source, "t.tex", &options, &NoopFileResolver)
            .run()
            .unwrap();
        let texts: Vec<_> = result.proofs.iter().map(Proof::as_str).collect();
        assert_eq!(texts, vec!["First .", "Third ."]);
        assert_eq!(
            result.skipped,
            vec![SkipReason::MathOutsideMath {
                command: "alpha".into()
            }]
        );
    }

    #[test]
    fn test_runaway_argument_recovers() {
        assert_eq!(
            proofs("\\begin{proof}\\footnote{oops \\end{proof}\\begin{proof}Good.\\end{proof}"),
            vec!["Good ."]
        );
    }

    #[test]
    fn test_abandon_counts_nested_proofs() {
        assert_eq!(
            proofs(
                "\\begin{proof}$x$^2 \\begin{proof}in\\end{proof} out\\end{proof}\
                 \\begin{proof}Next.\\end{proof}"
            ),
            vec!["Next ."]
        );
    }

    #[test]
    fn test_end_document_stops() {
        assert_eq!(
            proofs("\\begin{proof}A.\\end{proof}\\end{document}\\begin{proof}B.\\end{proof}"),
            vec!["A ."]
        );
    }

    #[test]
    fn test_render_body_placeholders() {
        assert_eq!(body("$x+y$"), "MATH");
        assert_eq!(body("\\cite{a,b} \\ref{thm1}"), "CITE REF");
    }
}
