//! Argument Reader
//!
//! Reads braced, optional, delimited and numeric arguments off the token
//! stream, and expands user macros with the arguments it reads.

use super::macros::MacroDef;
use super::stream::TokenStream;
use super::token::{TexToken, TokenList};
use super::{Engine, EngineWarning};
use crate::data::environments::is_proof_environment;
use crate::utils::error::{Interrupt, ScanResult, SkipReason};

/// Tokens a delimited parameter may span before the use is given up.
const MAX_DELIMITED_TOKENS: usize = 10_000;

const UNITS: &[&str] = &[
    "pt", "em", "ex", "in", "cm", "mm", "bp", "dd", "pc", "sp", "mu", "cc", "nd", "nc", "px",
];

impl Engine<'_> {
    // ========================================================================
    // Braced and Optional Arguments
    // ========================================================================

    /// Read one argument: a braced group without its braces, or a single
    /// token. A closing brace, `$`, `\begin` or `\end` is left in place and
    /// yields an empty argument.
    pub(crate) fn get_arg(&mut self) -> ScanResult<TokenList> {
        self.stream.skip_spaces();
        let token = match self.stream.next() {
            Some(token) => token,
            None => return Err(self.eof_interrupt("argument")),
        };
        match token {
            TexToken::BeginGroup => self.read_balanced("argument"),
            TexToken::EndGroup | TexToken::MathShift | TexToken::EndOfInput => {
                self.stream.push_back_one(token);
                Ok(TokenList::new())
            }
            TexToken::ControlSeq(_) if token.is_cs("begin") || token.is_cs("end") => {
                self.stream.push_back_one(token);
                Ok(TokenList::new())
            }
            other => Ok(TokenList::from_vec(vec![other])),
        }
    }

    /// Read up to the `}` matching an already consumed `{`.
    pub(crate) fn read_balanced(&mut self, context: &str) -> ScanResult<TokenList> {
        let mut depth = 1usize;
        let mut content = Vec::new();
        loop {
            let token = match self.stream.next() {
                Some(token) => token,
                None => return Err(self.eof_interrupt(context)),
            };
            match &token {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(TokenList::from_vec(content));
                    }
                }
                TexToken::ControlSeq(name) if name == "end" => self.check_runaway(token.clone())?,
                TexToken::EndOfInput => {
                    self.leave_include();
                    continue;
                }
                _ => {}
            }
            content.push(token);
        }
    }

    /// A `\end{proof}` met while reading an argument inside a proof: the
    /// argument is malformed. The `\end` goes back so the proof can still
    /// be closed by the recovery scan.
    fn check_runaway(&mut self, end: TexToken) -> ScanResult<()> {
        if !self.in_proof() {
            return Ok(());
        }
        match self.stream.peek_group_name(0) {
            Some((name, _)) if is_proof_environment(&name) => {
                self.stream.push_back_one(end);
                Err(Interrupt::SkipProof(SkipReason::RunawayArgument))
            }
            _ => Ok(()),
        }
    }

    /// `[...]` if the next non-space token is `[`. Brackets and braces
    /// inside are balanced.
    pub(crate) fn get_optional(&mut self) -> ScanResult<Option<TokenList>> {
        let offset = match self.stream.peek_past_spaces() {
            Some((offset, token)) if token.is_char('[') => offset,
            _ => return Ok(None),
        };
        self.stream.skip_tokens(offset + 1);
        let mut content = Vec::new();
        let mut brackets = 0usize;
        let mut braces = 0usize;
        loop {
            let token = match self.stream.next() {
                Some(token) => token,
                None => return Err(self.eof_interrupt("optional argument")),
            };
            match &token {
                TexToken::Char('[') if braces == 0 => brackets += 1,
                TexToken::Char(']') if braces == 0 => {
                    if brackets == 0 {
                        return Ok(Some(TokenList::from_vec(content)));
                    }
                    brackets -= 1;
                }
                TexToken::BeginGroup => braces += 1,
                TexToken::EndGroup => {
                    if braces == 0 {
                        self.stream.push_back_one(TexToken::EndGroup);
                        return Ok(Some(TokenList::from_vec(content)));
                    }
                    braces -= 1;
                }
                TexToken::ControlSeq(name) if name == "end" => self.check_runaway(token.clone())?,
                TexToken::EndOfInput => {
                    self.leave_include();
                    continue;
                }
                _ => {}
            }
            content.push(token);
        }
    }

    pub(crate) fn consume_star(&mut self) -> bool {
        if matches!(self.stream.peek(), Some(TexToken::Char('*'))) {
            self.stream.next();
            return true;
        }
        false
    }

    /// Consume arguments per signature and discard them.
    ///
    /// `s` star, `o` optional, `m` mandatory, `d` dimension, `n` number,
    /// `=` optional equals sign, `t` one raw token.
    pub(crate) fn consume_signature(&mut self, signature: &str) -> ScanResult<()> {
        for kind in signature.chars() {
            match kind {
                's' => {
                    self.consume_star();
                }
                'o' => {
                    self.get_optional()?;
                }
                'm' => {
                    self.get_arg()?;
                }
                'd' => self.read_dimen(),
                'n' => self.read_number()?,
                '=' => self.consume_equals(),
                't' => {
                    self.stream.next();
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ========================================================================
    // Numbers and Dimensions
    // ========================================================================

    pub(crate) fn consume_equals(&mut self) {
        self.stream.skip_spaces();
        if matches!(self.stream.peek(), Some(TexToken::Char('='))) {
            self.stream.next();
            self.stream.skip_spaces();
        }
    }

    fn consume_signs(&mut self) {
        loop {
            self.stream.skip_spaces();
            match self.stream.peek() {
                Some(TexToken::Char('+')) | Some(TexToken::Char('-')) => {
                    self.stream.next();
                }
                _ => break,
            }
        }
    }

    fn consume_digits(&mut self, decimal: bool) -> usize {
        let mut count = 0;
        while let Some(TexToken::Char(c)) = self.stream.peek() {
            let accepted = c.is_ascii_digit() || (decimal && (*c == '.' || *c == ','));
            if !accepted {
                break;
            }
            self.stream.next();
            count += 1;
        }
        count
    }

    fn consume_optional_space(&mut self) {
        if matches!(self.stream.peek(), Some(TexToken::Space)) {
            self.stream.next();
        }
    }

    /// A TeX number: digits, `"hex`, `'octal`, `` `c ``, or a register.
    pub(crate) fn read_number(&mut self) -> ScanResult<()> {
        self.consume_signs();
        match self.stream.peek() {
            Some(TexToken::ControlSeq(_)) => {
                if let Some(TexToken::ControlSeq(name)) = self.stream.next() {
                    if name == "value" {
                        self.get_arg()?;
                    }
                }
                return Ok(());
            }
            Some(TexToken::Char('`')) => {
                self.stream.next();
                self.stream.next();
            }
            Some(TexToken::Char('"')) | Some(TexToken::Char('\'')) => {
                self.stream.next();
                while matches!(self.stream.peek(), Some(TexToken::Char(c)) if c.is_ascii_hexdigit())
                {
                    self.stream.next();
                }
            }
            _ => {
                self.consume_digits(false);
            }
        }
        self.consume_optional_space();
        Ok(())
    }

    /// A dimension or glue: `-1.5pt`, `2\parindent`, `3pt plus 1fil minus 2pt`.
    pub(crate) fn read_dimen(&mut self) {
        self.read_dimen_component();
        if self.consume_keyword("plus") {
            self.read_dimen_component();
        }
        if self.consume_keyword("minus") {
            self.read_dimen_component();
        }
    }

    fn read_dimen_component(&mut self) {
        self.consume_signs();
        self.consume_digits(true);
        self.stream.skip_spaces();
        if matches!(self.stream.peek(), Some(TexToken::ControlSeq(_))) {
            self.stream.next();
            return;
        }
        self.consume_keyword("true");
        if self.consume_keyword("fil") {
            while matches!(self.stream.peek(), Some(TexToken::Char('l' | 'L'))) {
                self.stream.next();
            }
            self.consume_optional_space();
            return;
        }
        for unit in UNITS {
            if self.consume_keyword(unit) {
                return;
            }
        }
    }

    /// Consume `word` (case-insensitive, after optional spaces) and one
    /// trailing space. Nothing is consumed on a mismatch.
    fn consume_keyword(&mut self, word: &str) -> bool {
        let (offset, _) = match self.stream.peek_past_spaces() {
            Some(found) => found,
            None => return false,
        };
        let matched = word.chars().enumerate().all(|(i, expected)| {
            matches!(self.stream.peek_nth(offset + i),
                Some(TexToken::Char(c)) if c.eq_ignore_ascii_case(&expected))
        });
        if !matched {
            return false;
        }
        self.stream.skip_tokens(offset + word.chars().count());
        self.consume_optional_space();
        true
    }

    // ========================================================================
    // Macro Expansion
    // ========================================================================

    /// Expand a user macro in place; a use that does not match the
    /// definition's parameter text leaves the stream as it was and the name
    /// is dropped.
    pub(crate) fn expand_macro(&mut self, name: &str, def: &MacroDef) -> ScanResult<()> {
        match self.try_expand(name, def)? {
            Some(expansion) => self.stream.push_back(expansion),
            None => self.warn(EngineWarning::ExpansionFailed {
                name: name.to_string(),
            }),
        }
        Ok(())
    }

    fn try_expand(&mut self, name: &str, def: &MacroDef) -> ScanResult<Option<Vec<TexToken>>> {
        let mut matched = Vec::with_capacity(def.prefix.len());
        for expected in &def.prefix {
            match self.stream.next() {
                Some(token) if token == *expected => matched.push(token),
                Some(token) => {
                    matched.push(token);
                    self.stream.push_back(matched);
                    return Ok(None);
                }
                None => {
                    self.stream.push_back(matched);
                    return Ok(None);
                }
            }
        }

        let mut args = Vec::with_capacity(def.arity());
        for (index, delimiter) in def.params.iter().enumerate() {
            let arg = match (&def.optional, index) {
                (Some(default), 0) => self.get_optional()?.unwrap_or_else(|| default.clone()),
                _ if delimiter.is_empty() => self.get_arg()?,
                _ => match self.read_delimited(delimiter)? {
                    Some(arg) => arg,
                    None => return Ok(None),
                },
            };
            args.push(arg);
        }
        Ok(Some(substitute(name, &def.body, &args)))
    }

    /// Read up to `delimiter` at brace depth zero. One pair of braces
    /// around the whole argument is stripped.
    fn read_delimited(&mut self, delimiter: &[TexToken]) -> ScanResult<Option<TokenList>> {
        let mut content = Vec::new();
        let mut depth = 0usize;
        loop {
            if depth == 0 && self.stream_starts_with(delimiter) {
                self.stream.skip_tokens(delimiter.len());
                return Ok(Some(strip_braces(content)));
            }
            if content.len() > MAX_DELIMITED_TOKENS {
                self.stream.push_back(content);
                return Ok(None);
            }
            let token = match self.stream.next() {
                Some(token) => token,
                None => {
                    self.stream.push_back(content);
                    return Err(self.eof_interrupt("delimited argument"));
                }
            };
            match &token {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => {
                    if depth == 0 {
                        // `}` of an enclosing group: the delimiter never came
                        content.push(TexToken::EndGroup);
                        self.stream.push_back(content);
                        return Ok(None);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            content.push(token);
        }
    }

    fn stream_starts_with(&self, tokens: &[TexToken]) -> bool {
        tokens
            .iter()
            .enumerate()
            .all(|(i, expected)| self.stream.peek_nth(i) == Some(expected))
    }
}

/// Replace `#n` with the arguments and `##n` with `#n`. The macro's own
/// name in the result is made inert so a self-referencing definition
/// cannot expand forever.
pub fn substitute(name: &str, body: &TokenList, args: &[TokenList]) -> Vec<TexToken> {
    let make_inert = |token: &TexToken| match token {
        TexToken::ControlSeq(cs) if cs == name => TexToken::Inert(cs.clone()),
        other => other.clone(),
    };
    let mut out = Vec::with_capacity(body.len());
    for token in body.as_slice() {
        match token {
            TexToken::Param(n) => {
                if let Some(arg) = args.get(usize::from(*n).wrapping_sub(1)) {
                    out.extend(arg.as_slice().iter().map(&make_inert));
                }
            }
            TexToken::DeferredParam(n) => out.push(TexToken::Param(*n)),
            other => out.push(make_inert(other)),
        }
    }
    out
}

/// `{x}` becomes `x`; `{a}{b}` stays.
fn strip_braces(content: Vec<TexToken>) -> TokenList {
    let wrapped = content.len() >= 2
        && content.first() == Some(&TexToken::BeginGroup)
        && content.last() == Some(&TexToken::EndGroup)
        && {
            let mut depth = 0usize;
            content[..content.len() - 1].iter().all(|t| {
                match t {
                    TexToken::BeginGroup => depth += 1,
                    TexToken::EndGroup => depth -= 1,
                    _ => {}
                }
                depth > 0
            })
        };
    if wrapped {
        TokenList::from_vec(content[1..content.len() - 1].to_vec())
    } else {
        TokenList::from_vec(content)
    }
}

/// Read one braced group (or single token) from a local token stream.
/// Used when evaluating conditions that were read as an argument.
pub fn read_group(stream: &mut TokenStream) -> TokenList {
    stream.skip_spaces();
    match stream.next() {
        Some(TexToken::BeginGroup) => {
            let mut depth = 1usize;
            let mut content = Vec::new();
            while let Some(token) = stream.next() {
                match token {
                    TexToken::BeginGroup => depth += 1,
                    TexToken::EndGroup => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                content.push(token);
            }
            TokenList::from_vec(content)
        }
        Some(token) => TokenList::from_vec(vec![token]),
        None => TokenList::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ExtractOptions;
    use crate::core::engine::lexer::tokenize;
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
    fn test_get_arg_group_and_single_token() {
        with_engine("{a {b} c} x", |e| {
            assert_eq!(e.get_arg().unwrap().to_string(), "a {b} c");
            assert_eq!(e.get_arg().unwrap().to_string(), "x");
        });
    }

    #[test]
    fn test_get_arg_stops_at_structure() {
        with_engine("}", |e| {
            assert!(e.get_arg().unwrap().is_empty());
            assert_eq!(rest(e), "}");
        });
        with_engine("\\end{x}", |e| {
            assert!(e.get_arg().unwrap().is_empty());
        });
    }

    #[test]
    fn test_get_arg_eof_outside_proof_is_fatal() {
        with_engine("{never closed", |e| {
            assert!(matches!(e.get_arg(), Err(Interrupt::Fatal(_))));
        });
    }

    #[test]
    fn test_get_arg_runaway_inside_proof() {
        with_engine("{text \\end{proof}", |e| {
            e.context.proof_nesting = 1;
            assert_eq!(
                e.get_arg(),
                Err(Interrupt::SkipProof(SkipReason::RunawayArgument))
            );
            assert_eq!(rest(e), "\\end{proof}");
        });
    }

    #[test]
    fn test_get_optional() {
        with_engine(" [a [b] {]}] rest", |e| {
            assert_eq!(e.get_optional().unwrap().unwrap().to_string(), "a [b] {]}");
        });
        with_engine(" {m}", |e| {
            assert_eq!(e.get_optional().unwrap(), None);
            assert_eq!(rest(e), " {m}");
        });
    }

    #[test]
    fn test_consume_signature() {
        with_engine("*[opt]{arg} tail", |e| {
            e.consume_signature("som").unwrap();
            assert_eq!(rest(e), " tail");
        });
    }

    #[test]
    fn test_read_dimen_and_glue() {
        with_engine("-1.5pt plus 1fill minus 2pt word", |e| {
            e.read_dimen();
            assert_eq!(rest(e), "word");
        });
        with_engine("2\\parindent x", |e| {
            e.read_dimen();
            assert_eq!(rest(e), "x");
        });
    }

    #[test]
    fn test_arguments_are_brace_balanced() {
        let inputs = [
            "{a{b}c}[x{y}]{{}}z[{]}]{d}",
            "[o[p]q]{{{deep}}} x {e}}{f}",
            "[unclosed {brace] ]{g}",
            "{p}[x{",
            "\\foo[{]}]{\\end{x}}",
        ];
        for input in inputs {
            with_engine(input, |e| {
                for round in 0..8 {
                    let arg = if round % 2 == 0 {
                        e.get_optional().map(Option::unwrap_or_default)
                    } else {
                        e.get_arg()
                    };
                    match arg {
                        Ok(arg) => assert_eq!(arg.brace_balance(), 0, "{:?} from {}", arg, input),
                        Err(_) => break,
                    }
                }
            });
        }
    }

    #[test]
    fn test_read_number() {
        with_engine("= 10000 text", |e| {
            e.consume_equals();
            e.read_number().unwrap();
            assert_eq!(rest(e), "text");
        });
        with_engine("\\value{page} text", |e| {
            e.read_number().unwrap();
            assert_eq!(rest(e), " text");
        });
        with_engine("\\value{page", |e| {
            assert!(e.read_number().is_err());
        });
    }

    #[test]
    fn test_substitute() {
        let body = tokenize("\\f{#1}##1");
        let out = substitute("f", &body, &[tokenize("x")]);
        assert_eq!(
            out,
            vec![
                TexToken::Inert("f".into()),
                TexToken::BeginGroup,
                TexToken::Char('x'),
                TexToken::EndGroup,
                TexToken::Param(1),
            ]
        );
    }

    #[test]
    fn test_expand_with_default() {
        with_engine("[y] rest", |e| {
            let def = MacroDef::with_default(1, tokenize("d"), tokenize("<#1>"));
            e.expand_macro("m", &def).unwrap();
            assert_eq!(rest(e), "<y> rest");
        });
        with_engine(" rest", |e| {
            let def = MacroDef::with_default(1, tokenize("d"), tokenize("<#1>"));
            e.expand_macro("m", &def).unwrap();
            assert_eq!(rest(e), "<d> rest");
        });
    }

    #[test]
    fn test_expand_delimited() {
        with_engine("{a b} and c. tail", |e| {
            let def = MacroDef {
                params: vec![tokenize(" and").into_inner(), tokenize(".").into_inner()],
                body: tokenize("[#2|#1]"),
                ..MacroDef::default()
            };
            e.expand_macro("pair", &def).unwrap();
            assert_eq!(rest(e), "[ c|a b] tail");
        });
    }

    #[test]
    fn test_prefix_mismatch_leaves_stream() {
        with_engine("(x", |e| {
            let def = MacroDef {
                prefix: tokenize("[").into_inner(),
                body: tokenize("never"),
                ..MacroDef::default()
            };
            e.expand_macro("p", &def).unwrap();
            assert_eq!(rest(e), "(x");
            assert_eq!(e.context.warnings.len(), 1);
        });
    }

    #[test]
    fn test_read_group_local() {
        let mut stream = TokenStream::new(tokenize(" {a {b}} c"));
        assert_eq!(read_group(&mut stream).to_string(), "a {b}");
        assert_eq!(read_group(&mut stream).to_string(), "c");
        assert!(read_group(&mut stream).is_empty());
    }
}
