//! Grammar-driven completer for reedline
//!
//! Every completion request runs a full parse of the line with suggestion
//! capture enabled. Literal suggestions from the grammar are offered directly;
//! a suggestion whose single piece carries only a semantic type is expanded
//! through the [`SemanticProvider`], with the parse collector as context.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reedline::{Completer, Span, Suggestion};
use tracing::trace;

use super::provider::SemanticProvider;
use crate::grammar::{Grammar, SuggestPiece};

/// Completer backed by the compiled grammar and a candidate provider
pub struct GrammarCompleter {
    grammar: Arc<Grammar>,
    start_rule: String,
    provider: Arc<dyn SemanticProvider>,
    /// Monotonic request counter, for correlating trace output
    sequence: AtomicU64,
}

impl GrammarCompleter {
    /// Create a new completer parsing from `start_rule`
    pub fn new(
        grammar: Arc<Grammar>,
        start_rule: impl Into<String>,
        provider: Arc<dyn SemanticProvider>,
    ) -> Self {
        Self {
            grammar,
            start_rule: start_rule.into(),
            provider,
            sequence: AtomicU64::new(0),
        }
    }

    /// Byte index where the word under the cursor starts
    fn word_start(line: &str, pos: usize) -> usize {
        line[..pos]
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphanumeric())
            .last()
            .map(|(i, _)| i)
            .unwrap_or(pos)
    }

    /// A lone empty-valued piece marks a provider-expandable slot
    fn semantic_slot(pieces: &[SuggestPiece]) -> Option<&str> {
        match pieces {
            [piece] if piece.value.is_empty() => piece.semantic.as_deref(),
            _ => None,
        }
    }
}

impl Completer for GrammarCompleter {
    /// Complete the input at the given cursor position
    ///
    /// `pos` is a byte index; the grammar cursor is character-based.
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let pos = pos.min(line.len());
        let cursor = line[..pos].chars().count();

        let Ok(outcome) = self.grammar.parse(line, cursor, true, &self.start_rule) else {
            return Vec::new();
        };

        let word_start = Self::word_start(line, pos);
        let word_prefix = &line[word_start..pos];

        let mut suggestions: Vec<Suggestion> = Vec::new();
        for pieces in &outcome.suggestions {
            if let Some(semantic) = Self::semantic_slot(pieces) {
                for candidate in
                    self.provider
                        .candidates(semantic, word_prefix, &outcome.collector)
                {
                    suggestions.push(Suggestion {
                        value: candidate,
                        description: Some(semantic.to_string()),
                        style: None,
                        extra: None,
                        span: Span::new(word_start, pos),
                        append_whitespace: false,
                        match_indices: None,
                    });
                }
                continue;
            }

            let flat: String = pieces.iter().map(|p| p.value.as_str()).collect();
            if flat.is_empty() {
                continue;
            }

            // identifier remainders replace the word under the cursor so the
            // menu shows the whole keyword; punctuation chains insert as-is
            let (value, span) = if flat.starts_with(|c: char| c.is_alphanumeric()) {
                (format!("{word_prefix}{flat}"), Span::new(word_start, pos))
            } else {
                (flat, Span::new(pos, pos))
            };

            suggestions.push(Suggestion {
                value,
                description: pieces.first().and_then(|p| p.class.clone()),
                style: None,
                extra: None,
                span,
                append_whitespace: false,
                match_indices: None,
            });
        }

        suggestions.dedup_by(|a, b| a.value == b.value && a.span.start == b.span.start);
        trace!(seq, count = suggestions.len(), "completion pass");
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::lang;
    use crate::repl::provider::StaticProvider;

    fn create_test_completer() -> GrammarCompleter {
        let grammar = Arc::new(lang::grammar().unwrap());
        GrammarCompleter::new(
            grammar,
            lang::START_RULE,
            Arc::new(StaticProvider::with_defaults()),
        )
    }

    #[test]
    fn test_keyword_completion_replaces_word() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("wri", 3);

        assert!(suggestions.iter().any(|s| s.value == "write"));
        for suggestion in &suggestions {
            assert_eq!(suggestion.span.start, 0);
            assert_eq!(suggestion.span.end, 3);
        }
    }

    #[test]
    fn test_punctuation_chain_inserts_at_cursor() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("w ##", 4);

        let class = suggestions
            .iter()
            .find(|s| s.value == "class")
            .expect("##class introducer completed");
        assert_eq!(class.span.start, 4);
        assert_eq!(class.span.end, 4);
    }

    #[test]
    fn test_provider_expands_function_names() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("w $pi", 5);

        let piece = suggestions
            .iter()
            .find(|s| s.value == "piece")
            .expect("intrinsic function expanded");
        assert_eq!(piece.description.as_deref(), Some("function"));
        assert_eq!(piece.span.start, 3);
        assert_eq!(piece.span.end, 5);
    }

    #[test]
    fn test_no_suggestions_after_error() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("write @ ", 8);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_word_start() {
        assert_eq!(GrammarCompleter::word_start("set na", 6), 4);
        assert_eq!(GrammarCompleter::word_start("w ##", 4), 4);
        assert_eq!(GrammarCompleter::word_start("wri", 3), 0);
    }
}
