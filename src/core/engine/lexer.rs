//! Token Source: raw text to TeX tokens.
//!
//! Processing order for one file:
//!
//! ```text
//! text → line endings → decomment → fixups → \par insertion → tokenize
//! ```
//!
//! `@` always counts as a letter inside control-sequence names, so files
//! that rely on `\makeatletter` lex the same with or without it.

use super::token::{TexToken, TokenList};
use crate::data::fixups::{apply_fixups, Fixup};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    /// A newline, optional horizontal space, then at least one more newline.
    static ref BLANK_LINES: Regex = Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").unwrap();
}

/// Run the whole text pipeline and tokenize.
pub fn lex_source(text: &str, path: &str, fixups: &[Fixup]) -> TokenList {
    tokenize(&prepare_source(text, path, fixups))
}

/// Everything before tokenizing: line endings, comments, fixups and
/// paragraph markers.
pub fn prepare_source(text: &str, path: &str, fixups: &[Fixup]) -> String {
    let text = normalize_line_endings(text);
    let text = decomment(&text);
    let text = apply_fixups(&text, path, fixups);
    insert_paragraphs(&text).into_owned()
}

pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Replace blank-line runs by an explicit `\par`.
pub fn insert_paragraphs(text: &str) -> Cow<'_, str> {
    BLANK_LINES.replace_all(text, " \\par ")
}

/// Strip TeX comments.
///
/// A `%` preceded by an odd number of backslashes is literal. A comment
/// takes its newline and the continuation line's leading blanks with it,
/// except that a blank continuation line keeps the newline (so the
/// paragraph break survives) and a comment directly after a control word
/// leaves a single space behind.
pub fn decomment(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            '%' => {
                let mut eol = i;
                while eol < chars.len() && chars[eol] != '\n' {
                    eol += 1;
                }
                if eol >= chars.len() {
                    break;
                }
                let mut next = eol + 1;
                while next < chars.len() && matches!(chars[next], ' ' | '\t') {
                    next += 1;
                }
                if next >= chars.len() || chars[next] == '\n' {
                    out.push('\n');
                    i = eol + 1;
                    continue;
                }
                if ends_with_control_word(&out) {
                    out.push(' ');
                }
                i = next;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// True if `text` ends in `\name` with an unescaped backslash.
fn ends_with_control_word(text: &str) -> bool {
    let letters = text
        .chars()
        .rev()
        .take_while(|c| is_cs_letter(*c))
        .count();
    if letters == 0 {
        return false;
    }
    let backslashes = text
        .chars()
        .rev()
        .skip(letters)
        .take_while(|c| *c == '\\')
        .count();
    backslashes % 2 == 1
}

fn is_cs_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '@'
}

/// Tokenize prepared source text.
pub fn tokenize(input: &str) -> TokenList {
    Lexer::new(input).tokenize()
}

/// The TeX lexer
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
        }
    }

    pub fn tokenize(mut self) -> TokenList {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        TokenList::from_vec(tokens)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn read_control_seq(&mut self) -> Option<TexToken> {
        let first = self.chars.next()?;
        if !is_cs_letter(first) {
            let name = if first == '\n' { ' ' } else { first };
            return Some(TexToken::ControlSeq(name.to_string()));
        }
        let mut name = String::new();
        name.push(first);
        while let Some(&c) = self.chars.peek() {
            if !is_cs_letter(c) {
                break;
            }
            name.push(c);
            self.chars.next();
        }
        self.skip_whitespace();
        Some(TexToken::ControlSeq(name))
    }

    fn read_param(&mut self) -> TexToken {
        match self.chars.peek() {
            Some(&d) if ('1'..='9').contains(&d) => {
                self.chars.next();
                TexToken::Param(d as u8 - b'0')
            }
            Some('#') => {
                let mut ahead = self.chars.clone();
                ahead.next();
                match ahead.next() {
                    Some(d) if ('1'..='9').contains(&d) => {
                        self.chars.next();
                        self.chars.next();
                        TexToken::DeferredParam(d as u8 - b'0')
                    }
                    _ => TexToken::Char('#'),
                }
            }
            _ => TexToken::Char('#'),
        }
    }

    fn read_dashes(&mut self) -> TexToken {
        let mut count = 1;
        while count < 3 && self.chars.peek() == Some(&'-') {
            self.chars.next();
            count += 1;
        }
        match count {
            1 => TexToken::Char('-'),
            2 => TexToken::Char('\u{2013}'),
            _ => TexToken::Char('\u{2014}'),
        }
    }

    fn next_token(&mut self) -> Option<TexToken> {
        let c = self.chars.next()?;
        let token = match c {
            '\\' => match self.read_control_seq() {
                Some(token) => token,
                None => TexToken::Char('\\'),
            },
            '{' => TexToken::BeginGroup,
            '}' => TexToken::EndGroup,
            '$' => TexToken::MathShift,
            '&' => TexToken::AlignTab,
            '^' => TexToken::Superscript,
            '_' => TexToken::Subscript,
            '~' => TexToken::ActiveChar('~'),
            '#' => self.read_param(),
            '-' => self.read_dashes(),
            '`' if self.chars.peek() == Some(&'`') => {
                self.chars.next();
                TexToken::Char('"')
            }
            '\'' if self.chars.peek() == Some(&'\'') => {
                self.chars.next();
                TexToken::Char('"')
            }
            c if c.is_whitespace() => {
                self.skip_whitespace();
                TexToken::Space
            }
            c => TexToken::Char(c),
        };
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(name: &str) -> TexToken {
        TexToken::ControlSeq(name.to_string())
    }

    #[test]
    fn test_decomment_keeps_escaped_percent() {
        assert_eq!(decomment("a \\% b % comment\nc"), "a \\% b c");
    }

    #[test]
    fn test_decomment_is_idempotent() {
        let inputs = [
            "a \\% b % comment\nc",
            "x % one\n   % two\n  y",
            "\\foo% tail\nbar",
            "line% gone\n\nnext",
            "\\\\% comment after linebreak\nz",
        ];
        for input in inputs {
            let once = decomment(input);
            assert_eq!(decomment(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_decomment_after_control_word_inserts_space() {
        assert_eq!(decomment("\\foo% tail\nbar"), "\\foo bar");
        assert_eq!(decomment("foo% tail\nbar"), "foobar");
    }

    #[test]
    fn test_decomment_keeps_paragraph_break() {
        assert_eq!(decomment("line% gone\n\nnext"), "line\n\nnext");
    }

    #[test]
    fn test_decomment_double_backslash_then_comment() {
        assert_eq!(decomment("a\\\\% c\nb"), "a\\\\b");
    }

    #[test]
    fn test_paragraph_insertion() {
        assert_eq!(insert_paragraphs("a\n  \n\nb"), "a \\par b");
        assert_eq!(insert_paragraphs("a\nb"), "a\nb");
    }

    #[test]
    fn test_control_word_absorbs_spaces() {
        let tokens = tokenize("\\foo  bar").into_inner();
        assert_eq!(tokens[0], cs("foo"));
        assert_eq!(tokens[1], TexToken::Char('b'));
    }

    #[test]
    fn test_control_symbol_keeps_following_space() {
        let tokens = tokenize("\\% x").into_inner();
        assert_eq!(tokens, vec![cs("%"), TexToken::Space, TexToken::Char('x')]);
    }

    #[test]
    fn test_at_is_a_letter() {
        let tokens = tokenize("\\@ifnextchar").into_inner();
        assert_eq!(tokens, vec![cs("@ifnextchar")]);
    }

    #[test]
    fn test_whitespace_collapses() {
        let tokens = tokenize("a \n\t b").into_inner();
        assert_eq!(
            tokens,
            vec![TexToken::Char('a'), TexToken::Space, TexToken::Char('b')]
        );
    }

    #[test]
    fn test_quote_and_dash_ligatures() {
        let text: String = tokenize("``a'' b-c--d---e")
            .into_iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(text, "\"a\" b-c\u{2013}d\u{2014}e");
    }

    #[test]
    fn test_params() {
        let tokens = tokenize("#1##2#x").into_inner();
        assert_eq!(
            tokens,
            vec![
                TexToken::Param(1),
                TexToken::DeferredParam(2),
                TexToken::Char('#'),
                TexToken::Char('x'),
            ]
        );
    }

    #[test]
    fn test_structural_tokens() {
        let tokens = tokenize("{$&^_~}").into_inner();
        assert_eq!(
            tokens,
            vec![
                TexToken::BeginGroup,
                TexToken::MathShift,
                TexToken::AlignTab,
                TexToken::Superscript,
                TexToken::Subscript,
                TexToken::ActiveChar('~'),
                TexToken::EndGroup,
            ]
        );
    }

    #[test]
    fn test_prepare_source_pipeline() {
        let prepared = prepare_source("a\r\n% note\r\n\r\nb", "x.tex", &[]);
        assert_eq!(prepared, "a \\par b");
    }
}
