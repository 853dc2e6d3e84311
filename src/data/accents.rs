//! Accent and special-letter tables for prose text.
//!
//! Accents appear in author names and loan words inside proofs, so they
//! are translated into a base letter followed by a Unicode combining mark
//! instead of being dropped.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Accent commands (name without backslash) to combining characters
    pub static ref ACCENT_COMMANDS: HashMap<&'static str, char> = {
        let mut m = HashMap::new();
        m.insert("`", '\u{0300}'); // grave
        m.insert("'", '\u{0301}'); // acute
        m.insert("^", '\u{0302}'); // circumflex
        m.insert("~", '\u{0303}'); // tilde
        m.insert("\"", '\u{0308}'); // diaeresis
        m.insert("=", '\u{0304}'); // macron
        m.insert(".", '\u{0307}'); // dot above
        m.insert("u", '\u{0306}'); // breve
        m.insert("v", '\u{030C}'); // caron
        m.insert("H", '\u{030B}'); // double acute
        m.insert("c", '\u{0327}'); // cedilla
        m.insert("k", '\u{0328}'); // ogonek
        m.insert("d", '\u{0323}'); // dot below
        m.insert("b", '\u{0331}'); // macron below
        m.insert("t", '\u{0361}'); // tie
        m.insert("r", '\u{030A}'); // ring above
        m.insert("G", '\u{030F}'); // double grave
        m.insert("textogonekcentered", '\u{0328}');
        m
    };

    /// Special letter commands (no arguments)
    pub static ref LETTER_COMMANDS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("aa", "\u{e5}");
        m.insert("AA", "\u{c5}");
        m.insert("ae", "\u{e6}");
        m.insert("AE", "\u{c6}");
        m.insert("oe", "\u{153}");
        m.insert("OE", "\u{152}");
        m.insert("o", "\u{f8}");
        m.insert("O", "\u{d8}");
        m.insert("l", "\u{142}");
        m.insert("L", "\u{141}");
        m.insert("ss", "\u{df}");
        m.insert("SS", "SS");
        m.insert("i", "\u{131}");
        m.insert("j", "\u{237}");
        m.insert("dh", "\u{f0}");
        m.insert("DH", "\u{d0}");
        m.insert("th", "\u{fe}");
        m.insert("TH", "\u{de}");
        m.insert("dj", "\u{111}");
        m.insert("DJ", "\u{110}");
        m.insert("ng", "\u{14b}");
        m.insert("NG", "\u{14a}");
        m
    };
}

/// Look up the combining mark for an accent command.
pub fn accent_mark(name: &str) -> Option<char> {
    ACCENT_COMMANDS.get(name).copied()
}

/// Look up a special letter command such as `\ss` or `\o`.
pub fn special_letter(name: &str) -> Option<&'static str> {
    LETTER_COMMANDS.get(name).copied()
}

/// Attach a combining mark to the first character of `base`.
///
/// `\'{ab}` puts the accent on `a`. An empty base yields an empty string.
pub fn apply_accent(base: &str, mark: char) -> String {
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(base.len() + mark.len_utf8());
            out.push(first);
            out.push(mark);
            out.extend(chars);
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_accent_suffix() {
        assert_eq!(apply_accent("e", accent_mark("'").unwrap()), "e\u{301}");
        assert_eq!(apply_accent("ab", '\u{308}'), "a\u{308}b");
        assert_eq!(apply_accent("", '\u{308}'), "");
    }

    #[test]
    fn test_special_letters() {
        assert_eq!(special_letter("ss"), Some("\u{df}"));
        assert_eq!(special_letter("theta"), None);
    }
}
