//! Suggestion generator - literal completions reachable from a parse state
//!
//! Given the state captured at the cursor and the already-typed prefix of the
//! lexeme under it, walks the table forward and enumerates the literal text
//! that could legally follow. Each suggestion is the post-cursor text only,
//! as an ordered list of pieces so the host can style keyword and punctuation
//! parts differently.
//!
//! Identifiers are atomic: a candidate keyword either completes the prefix in
//! one piece or is discarded, and a completed identifier ends its path. Char
//! literals accumulate: consecutive single-character rows chain into one
//! multi-piece suggestion (so a cursor after `##` can offer `class(`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::lexer::LexemeKind;
use super::table::{AutomatonTable, Matcher, StateId};

/// Walked states per enumeration before giving up on a branch
const MAX_DEPTH: usize = 16;

/// Upper bound on distinct suggestions returned
const MAX_SUGGESTIONS: usize = 64;

/// One styled fragment of a suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestPiece {
    /// Text to insert after the cursor
    pub value: String,
    /// Highlight class of the row that contributed this piece
    pub class: Option<String>,
    /// Semantic type of the row, for provider-backed expansion
    pub semantic: Option<String>,
}

/// Enumerate literal completions from `state` given the typed `prefix`
pub fn suggestions(
    table: &AutomatonTable,
    state: StateId,
    prefix: &str,
) -> Vec<Vec<SuggestPiece>> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    walk(table, state, prefix, &mut Vec::new(), &mut visited, &mut out);
    out
}

fn walk(
    table: &AutomatonTable,
    state: StateId,
    prefix: &str,
    path: &mut Vec<SuggestPiece>,
    visited: &mut HashSet<StateId>,
    out: &mut Vec<Vec<SuggestPiece>>,
) {
    if out.len() >= MAX_SUGGESTIONS || path.len() >= MAX_DEPTH {
        return;
    }
    // cycle guard along the current path
    if !visited.insert(state) {
        return;
    }

    for row in table.rows(state) {
        match &row.matcher {
            Matcher::Literal { kind, spec } => {
                let Some(value) = &spec.value else {
                    // wildcard identifier rows have no literal text, but their
                    // semantic type lets a provider fill in candidates
                    if *kind == LexemeKind::Identifier
                        && spec.semantic.is_some()
                        && path.is_empty()
                    {
                        emit(
                            vec![SuggestPiece {
                                value: String::new(),
                                class: spec.class.clone(),
                                semantic: spec.semantic.clone(),
                            }],
                            out,
                        );
                    }
                    continue;
                };
                match kind {
                    LexemeKind::Identifier => {
                        if value.len() > prefix.len() && value.starts_with(prefix) {
                            let mut suggestion = path.clone();
                            suggestion.push(SuggestPiece {
                                value: value[prefix.len()..].to_string(),
                                class: spec.class.clone(),
                                semantic: spec.semantic.clone(),
                            });
                            emit(suggestion, out);
                        }
                    }
                    LexemeKind::Char => {
                        if let Some(rest) = prefix.strip_prefix(value.as_str()) {
                            // already typed, descend without emitting
                            walk(table, row.next, rest, path, visited, out);
                        } else if prefix.is_empty() {
                            path.push(SuggestPiece {
                                value: value.clone(),
                                class: spec.class.clone(),
                                semantic: spec.semantic.clone(),
                            });
                            emit(path.clone(), out);
                            walk(table, row.next, "", path, visited, out);
                            path.pop();
                        }
                    }
                    // whitespace, strings and constants end the path: there is
                    // no single literal continuation to offer
                    _ => {}
                }
            }
            Matcher::Epsilon | Matcher::TryMarker => {
                let next = if row.next == 0 { row.push } else { Some(row.next) };
                if let Some(next) = next.filter(|&n| n != 0) {
                    walk(table, next, prefix, path, visited, out);
                }
            }
            Matcher::OptionalWhitespace => {
                if row.next != 0 {
                    walk(table, row.next, prefix, path, visited, out);
                }
            }
            Matcher::MatchAny { .. } | Matcher::Fail => {}
        }
    }

    visited.remove(&state);
}

fn emit(suggestion: Vec<SuggestPiece>, out: &mut Vec<Vec<SuggestPiece>>) {
    if !suggestion.is_empty() && !out.contains(&suggestion) && out.len() < MAX_SUGGESTIONS {
        out.push(suggestion);
    }
}
