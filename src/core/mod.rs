//! Core extraction modules
//!
//! - `engine`: the TeX interpreter (token source, macros, dispatch, skipping)
//! - `collector`: proof accumulation and the per-file driving loop
//! - `context`: extraction options

pub mod collector;
pub mod context;
pub mod engine;

pub use collector::{FileProofs, Fragment, Proof, ProofAccumulator, ProofOutcome};
pub use context::ExtractOptions;
pub use engine::{Engine, EngineWarning};
