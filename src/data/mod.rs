//! Data layer - static tables driving the interpreter
//!
//! - Command effect table and math-only commands
//! - Accent marks and special letters
//! - Environment classes
//! - Standard-distribution allow-list
//! - Per-file source fixups

pub mod accents;
pub mod commands;
pub mod environments;
pub mod fixups;
pub mod stdlib;

pub use commands::{
    effect_of, CommandEffect, ConditionalKind, DefinitionKind, IncludeKind, Placeholder,
};
pub use environments::{classify_environment, is_proof_environment, EnvironmentClass};
pub use fixups::{apply_fixups, load_fixups, parse_fixups, Fixup};
pub use stdlib::StdLibrary;
