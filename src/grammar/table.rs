//! Automaton table - the compiled grammar artifact
//!
//! Purely data, no behavior: a growable mapping from state index to an ordered
//! list of transition rows. Rows are tried first-match-wins by the runtime, so
//! catch-all rows must come last in their state's list. State `0` is reserved
//! as the universal failure/pop state and never carries rows.
//!
//! Once compiled the table is immutable and safe to share across parses (and
//! across threads: nothing in a parse mutates it). The serde derives exist so a
//! host can persist a compiled table instead of recompiling the grammar on
//! every start.

use serde::{Deserialize, Serialize};

use super::lexer::{Lexeme, LexemeKind};

/// Index into the automaton table
pub type StateId = usize;

/// Normalized match description for a literal transition row
///
/// Authored shapes (bare value, value + class, value + semantic type) are all
/// normalized into this one struct at chain-construction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSpec {
    /// Exact value to match; `None` matches any lexeme of the right kind
    pub value: Option<String>,
    /// Highlight class stamped onto the lexeme on a successful match
    pub class: Option<String>,
    /// Semantic type appended to the collector on a successful match
    pub semantic: Option<String>,
}

impl MatchSpec {
    /// Bare exact-value spec
    pub fn exact(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Attach a highlight class
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Attach a semantic type consumed by completion providers
    pub fn semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    /// Check whether this spec accepts the given lexeme of `kind`
    pub fn accepts(&self, kind: LexemeKind, lexeme: &Lexeme) -> bool {
        if lexeme.kind != kind {
            return false;
        }
        match &self.value {
            Some(value) => *value == lexeme.value,
            None => true,
        }
    }
}

/// Matching condition of one transition row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Matcher {
    /// Matches unconditionally without consuming a lexeme
    Epsilon,
    /// Never matches; blocks a path unconditionally
    Fail,
    /// Speculative call marker: taken like `Epsilon` but records a checkpoint
    /// so the runtime can roll back and resume at the following row
    TryMarker,
    /// Matches any lexeme. `advance` distinguishes the consuming catch-all
    /// (`MatchAll`) from the silent one (`Any`)
    MatchAny { advance: bool },
    /// Matches one lexeme of the given kind, optionally by exact value
    Literal { kind: LexemeKind, spec: MatchSpec },
    /// Whitespace that may be absent: consumes a whitespace lexeme when
    /// present, passes through otherwise
    OptionalWhitespace,
}

/// One candidate transition at a state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRow {
    pub matcher: Matcher,
    /// Target state; `0` is the pop signal
    pub next: StateId,
    /// State pushed onto the return stack when this row is taken
    pub push: Option<StateId>,
}

/// Handle to a row inside the table, used by the compiler's patch lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle {
    pub state: StateId,
    pub row: usize,
}

/// The compiled transition table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomatonTable {
    states: Vec<Vec<TransitionRow>>,
}

impl AutomatonTable {
    /// Create a table with the reserved failure state `0`
    pub fn new() -> Self {
        Self {
            states: vec![Vec::new()],
        }
    }

    /// Allocate a fresh empty state and return its index
    pub fn alloc_state(&mut self) -> StateId {
        self.states.push(Vec::new());
        self.states.len() - 1
    }

    /// Append a row to a state, returning its handle
    pub fn push_row(&mut self, state: StateId, row: TransitionRow) -> RowHandle {
        let rows = &mut self.states[state];
        rows.push(row);
        RowHandle {
            state,
            row: rows.len() - 1,
        }
    }

    /// Rows of a state, in match order
    pub fn rows(&self, state: StateId) -> &[TransitionRow] {
        self.states
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Patch the target state of a previously appended row
    pub fn patch_next(&mut self, handle: RowHandle, next: StateId) {
        self.states[handle.state][handle.row].next = next;
    }

    /// Patch the stack push of a previously appended row
    pub fn patch_push(&mut self, handle: RowHandle, push: StateId) {
        self.states[handle.state][handle.row].push = Some(push);
    }

    /// Number of allocated states, the reserved one included
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True when only the reserved state exists
    pub fn is_empty(&self) -> bool {
        self.states.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_zero_is_reserved_and_empty() {
        let table = AutomatonTable::new();
        assert_eq!(table.len(), 1);
        assert!(table.rows(0).is_empty());
    }

    #[test]
    fn test_alloc_is_monotonic() {
        let mut table = AutomatonTable::new();
        assert_eq!(table.alloc_state(), 1);
        assert_eq!(table.alloc_state(), 2);
        assert_eq!(table.alloc_state(), 3);
    }

    #[test]
    fn test_rows_of_unknown_state_are_empty() {
        let table = AutomatonTable::new();
        assert!(table.rows(42).is_empty());
    }

    #[test]
    fn test_patching() {
        let mut table = AutomatonTable::new();
        let s = table.alloc_state();
        let handle = table.push_row(
            s,
            TransitionRow {
                matcher: Matcher::Epsilon,
                next: 0,
                push: None,
            },
        );
        table.patch_next(handle, 7);
        table.patch_push(handle, 9);
        assert_eq!(table.rows(s)[0].next, 7);
        assert_eq!(table.rows(s)[0].push, Some(9));
    }

    #[test]
    fn test_match_spec_accepts() {
        let lexeme = Lexeme {
            kind: LexemeKind::Identifier,
            value: "write".to_string(),
            class: None,
            span: 0..5,
        };
        assert!(MatchSpec::exact("write").accepts(LexemeKind::Identifier, &lexeme));
        assert!(!MatchSpec::exact("set").accepts(LexemeKind::Identifier, &lexeme));
        assert!(MatchSpec::default().accepts(LexemeKind::Identifier, &lexeme));
        assert!(!MatchSpec::default().accepts(LexemeKind::Constant, &lexeme));
    }

    #[test]
    fn test_table_serialization_roundtrip() {
        let mut table = AutomatonTable::new();
        let s = table.alloc_state();
        table.push_row(
            s,
            TransitionRow {
                matcher: Matcher::Literal {
                    kind: LexemeKind::Identifier,
                    spec: MatchSpec::exact("write").class("keyword"),
                },
                next: 0,
                push: None,
            },
        );

        let json = serde_json::to_string(&table).unwrap();
        let restored: AutomatonTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), table.len());
        assert_eq!(restored.rows(s), table.rows(s));
    }
}
