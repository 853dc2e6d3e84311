//! Macro Table: per-file user definitions.
//!
//! One table exists per top-level file. Files pulled in by `\input` or
//! `\usepackage` write into the same table for the duration of that file.

use super::token::{TexToken, TokenList};
use crate::data::commands::protected_arity;
use fxhash::FxHashMap;

/// A user macro: `\def\name<prefix>#1<d1>#2<d2>{body}`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MacroDef {
    /// Tokens that must follow the name verbatim before the first parameter
    pub prefix: Vec<TexToken>,
    /// Delimiter after each parameter; empty for an undelimited parameter
    pub params: Vec<Vec<TexToken>>,
    /// Default for an optional first argument (`\newcommand[n][default]`)
    pub optional: Option<TokenList>,
    /// The replacement body
    pub body: TokenList,
}

impl MacroDef {
    /// `n` undelimited parameters.
    pub fn simple(num_args: usize, body: TokenList) -> Self {
        MacroDef {
            params: vec![Vec::new(); num_args],
            body,
            ..Default::default()
        }
    }

    /// `n` parameters, the first one optional with a default.
    pub fn with_default(num_args: usize, default: TokenList, body: TokenList) -> Self {
        MacroDef {
            optional: Some(default),
            ..Self::simple(num_args.max(1), body)
        }
    }

    /// A parameterless alias expanding to `tokens`.
    pub fn alias(tokens: Vec<TexToken>) -> Self {
        Self::simple(0, TokenList::from_vec(tokens))
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A table slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroEntry {
    Defined(MacroDef),
    /// Defined elsewhere and never to be redefined (the old name of a
    /// `\let`-renamed built-in).
    Frozen,
}

/// `\newenvironment{name}[n][default]{begin}{end}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDef {
    pub begin: MacroDef,
    pub end: TokenList,
}

/// Why a definition was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Frozen,
    ProtectedArity,
}

#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: FxHashMap<String, MacroEntry>,
    environments: FxHashMap<String, EnvironmentDef>,
    /// `\newif` and `\newboolean` flags with their current value
    conditionals: FxHashMap<String, bool>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a macro unless the name is frozen or the definition would
    /// replace a reference/citation command with one of the same arity.
    pub fn define(&mut self, name: &str, def: MacroDef) -> Result<(), Rejection> {
        if self.is_frozen(name) {
            return Err(Rejection::Frozen);
        }
        if protected_arity(name) == Some(def.arity()) {
            return Err(Rejection::ProtectedArity);
        }
        self.macros.insert(name.to_string(), MacroEntry::Defined(def));
        Ok(())
    }

    /// `\let\new\old` where `\old` is not a user macro: `\new` becomes an
    /// alias for `\old`, and `\old` is frozen so a later
    /// `\renewcommand\old{...\new...}` cannot loop.
    pub fn alias_builtin(&mut self, new: &str, old: &str) -> Result<(), Rejection> {
        if new == old {
            return Ok(());
        }
        self.define(new, MacroDef::alias(vec![TexToken::ControlSeq(old.to_string())]))?;
        self.freeze(old);
        Ok(())
    }

    pub fn freeze(&mut self, name: &str) {
        self.macros.insert(name.to_string(), MacroEntry::Frozen);
    }

    /// The definition, if `name` is a non-frozen user macro.
    pub fn lookup(&self, name: &str) -> Option<&MacroDef> {
        match self.macros.get(name) {
            Some(MacroEntry::Defined(def)) => Some(def),
            _ => None,
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn is_frozen(&self, name: &str) -> bool {
        matches!(self.macros.get(name), Some(MacroEntry::Frozen))
    }

    pub fn define_environment(&mut self, name: &str, def: EnvironmentDef) {
        self.environments.insert(name.to_string(), def);
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentDef> {
        self.environments.get(name)
    }

    pub fn has_environment(&self, name: &str) -> bool {
        self.environments.contains_key(name)
    }

    /// Declare a flag, initially false. Redeclaring keeps the value.
    pub fn declare_conditional(&mut self, name: &str) {
        self.conditionals.entry(name.to_string()).or_insert(false);
    }

    /// Set a flag; returns false if it was never declared.
    pub fn set_conditional(&mut self, name: &str, value: bool) -> bool {
        match self.conditionals.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn conditional(&self, name: &str) -> Option<bool> {
        self.conditionals.get(name).copied()
    }

    /// For `\iffoo`: the flag name if `cs` is a declared `\newif`.
    pub fn conditional_for_if(&self, cs: &str) -> Option<&str> {
        let base = cs.strip_prefix("if")?;
        self.conditionals.get_key_value(base).map(|(k, _)| k.as_str())
    }

    /// For `\footrue` / `\foofalse`: the flag and the value being set.
    pub fn conditional_setter(&self, cs: &str) -> Option<(String, bool)> {
        if let Some(base) = cs.strip_suffix("true") {
            if self.conditionals.contains_key(base) {
                return Some((base.to_string(), true));
            }
        }
        if let Some(base) = cs.strip_suffix("false") {
            if self.conditionals.contains_key(base) {
                return Some((base.to_string(), false));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::lexer::tokenize;

    #[test]
    fn test_define_and_lookup() {
        let mut table = MacroTable::new();
        table.define("R", MacroDef::simple(0, tokenize("\\mathbb{R}"))).unwrap();
        assert_eq!(table.lookup("R").map(|d| d.arity()), Some(0));
        assert!(table.lookup("Q").is_none());
    }

    #[test]
    fn test_frozen_rejects_redefinition() {
        let mut table = MacroTable::new();
        table.alias_builtin("oldsection", "section").unwrap();
        assert!(table.is_frozen("section"));
        assert_eq!(
            table.define("section", MacroDef::simple(0, tokenize("\\oldsection*"))),
            Err(Rejection::Frozen)
        );
        assert!(table.lookup("oldsection").is_some());
    }

    #[test]
    fn test_protected_arity() {
        let mut table = MacroTable::new();
        assert_eq!(
            table.define("ref", MacroDef::simple(1, tokenize("(#1)"))),
            Err(Rejection::ProtectedArity)
        );
        assert!(table.define("ref", MacroDef::simple(2, tokenize("#1#2"))).is_ok());
        assert!(table.define("lemref", MacroDef::simple(1, tokenize("#1"))).is_ok());
    }

    #[test]
    fn test_self_alias_is_a_no_op() {
        let mut table = MacroTable::new();
        table.alias_builtin("x", "x").unwrap();
        assert!(!table.is_defined("x"));
    }

    #[test]
    fn test_conditionals() {
        let mut table = MacroTable::new();
        table.declare_conditional("draft");
        assert_eq!(table.conditional_for_if("ifdraft"), Some("draft"));
        assert_eq!(table.conditional_setter("drafttrue"), Some(("draft".to_string(), true)));
        assert!(table.set_conditional("draft", true));
        assert_eq!(table.conditional("draft"), Some(true));
        assert!(!table.set_conditional("final", true));
        assert_eq!(table.conditional_for_if("iffinal"), None);
    }

    #[test]
    fn test_with_default_has_at_least_one_param() {
        let def = MacroDef::with_default(0, tokenize("x"), tokenize("#1"));
        assert_eq!(def.arity(), 1);
        assert!(def.optional.is_some());
    }
}
