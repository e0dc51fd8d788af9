//! Command-Language Terminal Library
//!
//! Core functionality of costerm, a terminal client for a command-language
//! shell. Every keystroke re-parses the input line against a compiled grammar,
//! driving live syntax highlighting and predictive autocomplete.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `grammar`: Grammar compiler, parse runtime and suggestion generator
//! - `repl`: Interactive terminal loop
//!
//! # Example
//!
//! ```
//! use costerm::grammar::lang;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let grammar = lang::grammar()?;
//!     let outcome = grammar.parse("write 12", 8, true, lang::START_RULE)?;
//!     assert!(outcome.error_at.is_none());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod grammar;
pub mod repl;

// Re-export commonly used types
pub use config::Config;
pub use error::{CostermError, GrammarError, Result};
pub use grammar::{Grammar, ParseOutcome, SuggestPiece};
pub use repl::{Repl, Session, SessionReply};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
