//! Error handling module.
//!
//! One crate-wide error enum wrapping the specific kinds, with a shared
//! [`Result`] alias. Grammar errors are authoring mistakes and always fatal;
//! parse-time problems with user input are never errors (the runtime recovers
//! and tags them instead).

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, CostermError, GrammarError, Result};
