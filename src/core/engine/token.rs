//! TeX token definitions for the interpreter.
//!
//! The lexer turns a decommented source into a flat sequence of these
//! tokens; everything downstream (macro expansion, argument reading,
//! math skipping) works on tokens rather than characters.

use std::fmt;

/// The smallest unit the interpreter sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TexToken {
    /// A control sequence like `\frac` or the control symbol `\%`.
    /// The string does NOT include the leading backslash.
    ControlSeq(String),

    /// Begin group token `{`
    BeginGroup,

    /// End group token `}`
    EndGroup,

    /// A parameter token `#1`..`#9` inside a macro body.
    Param(u8),

    /// A deferred parameter `##1`..`##9`, degraded to `Param` when the
    /// enclosing macro expands.
    DeferredParam(u8),

    /// A printable character (letters, digits, punctuation)
    Char(char),

    /// A run of whitespace collapsed to one token
    Space,

    /// Math shift `$`
    MathShift,

    /// Alignment tab `&`
    AlignTab,

    /// Superscript `^`
    Superscript,

    /// Subscript `_`
    Subscript,

    /// Active character `~`
    ActiveChar(char),

    /// A macro name neutralised by the recursion guard. It is a no-op
    /// wherever it is scanned.
    Inert(String),

    /// Marks the end of a file spliced in by `\input`.
    EndOfInput,
}

impl TexToken {
    /// Returns true if this token is whitespace
    pub fn is_space(&self) -> bool {
        matches!(self, TexToken::Space)
    }

    /// Returns the control sequence name if this is a ControlSeq token
    pub fn as_control_seq(&self) -> Option<&str> {
        match self {
            TexToken::ControlSeq(name) => Some(name),
            _ => None,
        }
    }

    /// Check if this is a specific control sequence
    pub fn is_cs(&self, name: &str) -> bool {
        matches!(self, TexToken::ControlSeq(n) if n == name)
    }

    /// Check if this is a specific character
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, TexToken::Char(x) if *x == c)
    }

    /// True for a character token holding a letter or digit.
    pub fn is_alphanumeric(&self) -> bool {
        matches!(self, TexToken::Char(c) if c.is_alphanumeric())
    }

    /// True for a lowercase letter, used by the implicit-period heuristic.
    pub fn is_lowercase_letter(&self) -> bool {
        matches!(self, TexToken::Char(c) if c.is_lowercase())
    }
}

impl fmt::Display for TexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexToken::ControlSeq(name) => write!(f, "\\{}", name),
            TexToken::BeginGroup => write!(f, "{{"),
            TexToken::EndGroup => write!(f, "}}"),
            TexToken::Param(n) => write!(f, "#{}", n),
            TexToken::DeferredParam(n) => write!(f, "##{}", n),
            TexToken::Char(c) => write!(f, "{}", c),
            TexToken::Space => write!(f, " "),
            TexToken::MathShift => write!(f, "$"),
            TexToken::AlignTab => write!(f, "&"),
            TexToken::Superscript => write!(f, "^"),
            TexToken::Subscript => write!(f, "_"),
            TexToken::ActiveChar(c) => write!(f, "{}", c),
            TexToken::Inert(_) | TexToken::EndOfInput => Ok(()),
        }
    }
}

/// A list of tokens, used for macro bodies and arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenList(pub Vec<TexToken>);

impl TokenList {
    pub fn new() -> Self {
        TokenList(Vec::new())
    }

    pub fn from_vec(tokens: Vec<TexToken>) -> Self {
        TokenList(tokens)
    }

    pub fn push(&mut self, token: TexToken) {
        self.0.push(token);
    }

    pub fn into_inner(self) -> Vec<TexToken> {
        self.0
    }

    pub fn as_slice(&self) -> &[TexToken] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The first control sequence in the list, if any.
    ///
    /// `\newcommand{\foo}` and `\newcommand\foo` both name `foo` this way.
    pub fn first_control_seq(&self) -> Option<&str> {
        self.0.iter().find_map(TexToken::as_control_seq)
    }

    /// Plain text of the list with grouping braces dropped and
    /// surrounding whitespace trimmed. Used for environment names, file
    /// names and string comparisons.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for token in &self.0 {
            match token {
                TexToken::BeginGroup | TexToken::EndGroup => {}
                other => out.push_str(&other.to_string()),
            }
        }
        out.trim().to_string()
    }

    /// Brace balance of the list: opening minus closing braces.
    pub fn brace_balance(&self) -> i64 {
        self.0.iter().fold(0, |acc, t| match t {
            TexToken::BeginGroup => acc + 1,
            TexToken::EndGroup => acc - 1,
            _ => acc,
        })
    }
}

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl From<Vec<TexToken>> for TokenList {
    fn from(tokens: Vec<TexToken>) -> Self {
        TokenList(tokens)
    }
}

impl IntoIterator for TokenList {
    type Item = TexToken;
    type IntoIter = std::vec::IntoIter<TexToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a TexToken;
    type IntoIter = std::slice::Iter<'a, TexToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_display() {
        assert_eq!(TexToken::ControlSeq("cite".into()).to_string(), "\\cite");
        assert_eq!(TexToken::Param(2).to_string(), "#2");
        assert_eq!(TexToken::DeferredParam(1).to_string(), "##1");
        assert_eq!(TexToken::Inert("foo".into()).to_string(), "");
        assert_eq!(TexToken::EndOfInput.to_string(), "");
    }

    #[test]
    fn test_plain_text_drops_braces() {
        let list = TokenList::from_vec(vec![
            TexToken::BeginGroup,
            TexToken::Char('p'),
            TexToken::Char('f'),
            TexToken::Char('*'),
            TexToken::EndGroup,
        ]);
        assert_eq!(list.to_plain_text(), "pf*");
    }

    #[test]
    fn test_first_control_seq() {
        let list = TokenList::from_vec(vec![
            TexToken::Space,
            TexToken::ControlSeq("R".into()),
        ]);
        assert_eq!(list.first_control_seq(), Some("R"));
        assert_eq!(TokenList::new().first_control_seq(), None);
    }

    #[test]
    fn test_brace_balance() {
        let list = TokenList::from_vec(vec![
            TexToken::BeginGroup,
            TexToken::BeginGroup,
            TexToken::EndGroup,
        ]);
        assert_eq!(list.brace_balance(), 1);
    }
}
