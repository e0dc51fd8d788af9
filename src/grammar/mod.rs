//! Grammar compilation and incremental predictive parsing
//!
//! The pipeline: rules are authored with the [`chain`] builder DSL, compiled
//! once by the [`Compiler`] into a shared [`AutomatonTable`], then replayed by
//! the parse runtime against every edit of the input line. One parse produces
//! highlight classes for every lexeme, literal completion suggestions at the
//! cursor, and a list of semantically typed fragments for external providers.
//!
//! The built-in command-language grammar lives in [`lang`]; hosts with their
//! own language assemble a [`Grammar`] through the [`Compiler`] directly.

pub mod chain;
pub mod compiler;
pub mod lang;
pub mod lexer;
pub mod runtime;
pub mod suggest;
pub mod table;

use std::collections::HashMap;

pub use chain::{chain, Chain};
pub use compiler::{compile_rule, Compiler};
pub use lexer::{Lexeme, LexemeKind, Lexer};
pub use runtime::{CollectedFragment, ParseOutcome};
pub use suggest::SuggestPiece;
pub use table::{AutomatonTable, MatchSpec, StateId};

use crate::error::GrammarError;

/// A sealed grammar: the compiled table plus the rule-name registry
///
/// Immutable after [`Compiler::finish`]; one instance serves every parse for
/// the lifetime of the session.
#[derive(Debug, Clone)]
pub struct Grammar {
    table: AutomatonTable,
    rules: HashMap<String, StateId>,
}

impl Grammar {
    pub(crate) fn new(table: AutomatonTable, rules: HashMap<String, StateId>) -> Self {
        Self { table, rules }
    }

    /// Parse one input line with the cursor at character offset `cursor`
    ///
    /// Never fails on input content; the only error is an unknown start rule.
    pub fn parse(
        &self,
        input: &str,
        cursor: usize,
        suggest_enabled: bool,
        start_rule: &str,
    ) -> Result<ParseOutcome, GrammarError> {
        let start = self
            .start_state(start_rule)
            .ok_or_else(|| GrammarError::UnknownStartRule(start_rule.to_string()))?;
        Ok(runtime::parse(
            &self.table,
            start,
            input,
            cursor,
            suggest_enabled,
        ))
    }

    /// Entry state of a rule, if it exists
    pub fn start_state(&self, rule: &str) -> Option<StateId> {
        self.rules.get(rule).copied()
    }

    /// The compiled transition table
    pub fn table(&self) -> &AutomatonTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_start_rule() {
        let grammar = compile_rule("cmd", chain().id("w").exit()).unwrap();
        let err = grammar.parse("w", 1, false, "nope").unwrap_err();
        assert!(matches!(err, GrammarError::UnknownStartRule(name) if name == "nope"));
    }

    #[test]
    fn test_parse_through_facade() {
        let grammar = compile_rule("cmd", chain().id("w").exit()).unwrap();
        let outcome = grammar.parse("w", 1, true, "cmd").unwrap();
        assert_eq!(outcome.error_at, None);
    }
}
