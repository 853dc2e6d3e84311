//! Per-file source corrections.
//!
//! A fixup replaces literal text in files whose path contains a given
//! pattern. They run after comment stripping, so `find` never has to
//! account for comments.
//!
//! No corrections are compiled in: the defaults in
//! [`ExtractOptions`](crate::ExtractOptions) carry an empty table, and
//! every fixup comes from a table loaded with `--fixups` (or passed to
//! `ExtractOptions::with_fixups`). Tables are tab-separated:
//!
//! ```text
//! # pattern<TAB>find<TAB>replace
//! 1203.0456/main.tex	\end{proof }	\end{proof}
//! ```

use std::borrow::Cow;
use std::path::Path;

/// One `(filename_pattern, find, replace)` correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    /// Substring matched against the file's path. Empty matches every file.
    pub filename_pattern: String,
    /// Literal text to look for.
    pub find: String,
    /// Replacement text.
    pub replace: String,
}

impl Fixup {
    pub fn new(
        filename_pattern: impl Into<String>,
        find: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Self {
            filename_pattern: filename_pattern.into(),
            find: find.into(),
            replace: replace.into(),
        }
    }

    pub fn applies_to(&self, path: &str) -> bool {
        path.contains(&self.filename_pattern)
    }
}

/// Apply every fixup whose pattern matches `path`.
pub fn apply_fixups<'t>(text: &'t str, path: &str, fixups: &[Fixup]) -> Cow<'t, str> {
    let mut result = Cow::Borrowed(text);
    for fixup in fixups.iter().filter(|f| f.applies_to(path)) {
        if fixup.find.is_empty() || !result.contains(fixup.find.as_str()) {
            continue;
        }
        result = Cow::Owned(result.replace(fixup.find.as_str(), &fixup.replace));
    }
    result
}

/// Parse a tab-separated fixup table. Blank lines and `#` lines are
/// skipped; a line with fewer than three fields is reported by number.
pub fn parse_fixups(text: &str) -> Result<Vec<Fixup>, String> {
    let mut fixups = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(pattern), Some(find), Some(replace)) => {
                fixups.push(Fixup::new(pattern, find, replace));
            }
            _ => return Err(format!("line {}: expected three tab-separated fields", index + 1)),
        }
    }
    Ok(fixups)
}

/// Load a fixup table from disk.
pub fn load_fixups(path: &Path) -> std::io::Result<Vec<Fixup>> {
    let text = std::fs::read_to_string(path)?;
    parse_fixups(&text).map_err(|msg| std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixup_only_touches_matching_files() {
        let fixups = vec![Fixup::new("paper42", "\\end{prof}", "\\end{proof}")];
        let text = "x \\end{prof}";
        assert_eq!(apply_fixups(text, "texes/paper42/main.tex", &fixups), "x \\end{proof}");
        assert_eq!(apply_fixups(text, "texes/other/main.tex", &fixups), text);
    }

    #[test]
    fn test_fixups_apply_in_order() {
        let fixups = vec![Fixup::new("", "a", "b"), Fixup::new("", "b", "c")];
        assert_eq!(apply_fixups("a", "f.tex", &fixups), "c");
    }

    #[test]
    fn test_parse_fixups() {
        let table = "# comment\n\np1\tfoo\tbar\np2\tx\t\n";
        let fixups = parse_fixups(table).unwrap();
        assert_eq!(fixups.len(), 2);
        assert_eq!(fixups[0], Fixup::new("p1", "foo", "bar"));
        assert_eq!(fixups[1].replace, "");
    }

    #[test]
    fn test_parse_fixups_rejects_short_lines() {
        let err = parse_fixups("only\tone").unwrap_err();
        assert!(err.contains("line 1"));
    }
}
