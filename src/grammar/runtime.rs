//! Parse runtime - walks the automaton table against a lexeme tape
//!
//! Re-invoked on every input change, always against the same immutable table.
//! The runtime tolerates incomplete and invalid input:
//!
//! - a speculative call (`TryMarker` row) records a checkpoint; a mismatch
//!   while the callee is still active restores the checkpoint and resumes row
//!   scanning just past the marker, as if the branch was never attempted. Once
//!   the callee returns, its checkpoint is committed and can no longer rewind
//!   the accepted region
//! - with no checkpoint left, the failing lexeme is tagged with the `error`
//!   class, the machine resets to state 0 and keeps consuming, so malformed
//!   input never blocks editing
//! - a per-position iteration budget guards against cyclic grammars; exceeding
//!   it abandons the parse early and returns whatever was produced
//!
//! While walking, the runtime records the state that was current when the
//! lexeme under the cursor started matching; that state seeds the suggestion
//! generator.

use tracing::warn;

use super::lexer::{Lexeme, LexemeKind, Lexer};
use super::suggest::{self, SuggestPiece};
use super::table::{AutomatonTable, Matcher, StateId, TransitionRow};

/// Row-scan iterations allowed per lexeme position before the parse is
/// abandoned as cyclic
pub const LOOP_BUDGET: usize = 256;

/// Highlight class stamped onto lexemes no rule could claim
pub const ERROR_CLASS: &str = "error";

/// One semantically typed fragment accumulated for completion providers
///
/// Untyped matches between typed ones collapse into a single `Separator`, so
/// providers can split the context back into argument groups.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectedFragment {
    Typed { semantic: String, value: String },
    Separator,
}

/// Result of one parse invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// The full lexeme tape with highlight classes stamped in
    pub lexemes: Vec<Lexeme>,
    /// Literal completion fragments reachable from the cursor
    pub suggestions: Vec<Vec<SuggestPiece>>,
    /// Semantic fragments for external providers
    pub collector: Vec<CollectedFragment>,
    /// Index of the deepest lexeme that failed to match, if any
    pub error_at: Option<usize>,
    /// True when the iteration budget was exceeded and the parse stopped early
    pub aborted: bool,
    /// Total character length consumed by matching; equals the input length
    /// after a clean parse of a fully consuming grammar
    pub consumed_len: usize,
}

/// Snapshot for rolling back a speculative call
///
/// Value-semantics copies of lengths and indices only; restoring truncates the
/// live stacks back to these marks.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    state: StateId,
    row: usize,
    return_len: usize,
    pos: usize,
    consumed_len: usize,
    collector_len: usize,
    ws_matched: bool,
}

/// What one row scan did
enum Step {
    /// A lexeme was consumed
    Advanced,
    /// Moved to another state without consuming
    Moved,
    /// Rolled back to a checkpoint; resume scanning at this row index
    Resume(usize),
    /// No match and no checkpoint: error lexeme consumed
    Recovered,
}

/// Ephemeral state of one parse invocation
struct ParseSession<'a> {
    table: &'a AutomatonTable,
    lexemes: Vec<Lexeme>,
    state: StateId,
    pos: usize,
    consumed_len: usize,
    return_stack: Vec<StateId>,
    try_stack: Vec<Checkpoint>,
    collector: Vec<CollectedFragment>,
    cursor: usize,
    error_at: Option<usize>,
    suggest: (StateId, String),
    /// True while the current inter-token gap has already produced a
    /// whitespace match; cleared when a non-whitespace lexeme is consumed
    ws_matched: bool,
    /// Whether the cursor was actually reached during matching; the default
    /// start-of-line capture only counts for error-free parses
    captured: bool,
    aborted: bool,
}

/// Parse `input` against the table starting at `start`
pub(crate) fn parse(
    table: &AutomatonTable,
    start: StateId,
    input: &str,
    cursor: usize,
    suggest_enabled: bool,
) -> ParseOutcome {
    let mut session = ParseSession {
        table,
        lexemes: Lexer::tokenize(input),
        state: start,
        pos: 0,
        consumed_len: 0,
        return_stack: Vec::new(),
        try_stack: Vec::new(),
        collector: Vec::new(),
        cursor,
        error_at: None,
        suggest: (start, String::new()),
        ws_matched: false,
        captured: false,
        aborted: false,
    };
    session.run();

    let suggestions = if suggest_enabled && (session.error_at.is_none() || session.captured) {
        let (state, prefix) = session.suggest.clone();
        suggest::suggestions(table, state, &prefix)
    } else {
        Vec::new()
    };

    ParseOutcome {
        lexemes: session.lexemes,
        suggestions,
        collector: session.collector,
        error_at: session.error_at,
        aborted: session.aborted,
        consumed_len: session.consumed_len,
    }
}

impl ParseSession<'_> {
    fn run(&mut self) {
        let mut row_start = 0;
        let mut budget = LOOP_BUDGET;

        while self.pos < self.lexemes.len() {
            if budget == 0 {
                warn!(
                    state = self.state,
                    position = self.pos,
                    "iteration budget exceeded, abandoning parse"
                );
                self.aborted = true;
                break;
            }
            budget -= 1;

            if row_start == 0 {
                self.capture_suggest();
            }

            match self.step(row_start) {
                Step::Advanced | Step::Recovered => {
                    row_start = 0;
                    budget = LOOP_BUDGET;
                }
                Step::Moved => row_start = 0,
                Step::Resume(row) => row_start = row,
            }
        }
    }

    /// Scan the current state's rows from `row_start` for the current lexeme
    fn step(&mut self, row_start: usize) -> Step {
        let mut i = row_start;
        loop {
            let Some(row) = self.table.rows(self.state).get(i).cloned() else {
                break;
            };

            match &row.matcher {
                Matcher::Fail => {}
                Matcher::Epsilon => {
                    self.take(&row);
                    return Step::Moved;
                }
                Matcher::TryMarker => {
                    self.try_stack.push(Checkpoint {
                        state: self.state,
                        row: i,
                        return_len: self.return_stack.len(),
                        pos: self.pos,
                        consumed_len: self.consumed_len,
                        collector_len: self.collector.len(),
                        ws_matched: self.ws_matched,
                    });
                    self.take(&row);
                    return Step::Moved;
                }
                Matcher::MatchAny { advance } => {
                    self.consume(*advance);
                    self.take(&row);
                    return Step::Advanced;
                }
                Matcher::OptionalWhitespace => {
                    if self.current_kind() == LexemeKind::Whitespace && !self.ws_matched {
                        self.consume(true);
                        self.take(&row);
                        return Step::Advanced;
                    }
                    self.take(&row);
                    return Step::Moved;
                }
                Matcher::Literal { kind, spec } => {
                    if *kind == LexemeKind::Whitespace {
                        if self.current_kind() == LexemeKind::Whitespace && !self.ws_matched {
                            self.claim(spec.class.as_deref(), spec.semantic.as_deref());
                            self.consume(true);
                            self.take(&row);
                            return Step::Advanced;
                        }
                        if self.ws_matched {
                            // this gap already produced a whitespace match
                            self.take(&row);
                            return Step::Moved;
                        }
                    } else if spec.accepts(*kind, &self.lexemes[self.pos]) {
                        self.claim(spec.class.as_deref(), spec.semantic.as_deref());
                        self.consume(true);
                        self.take(&row);
                        return Step::Advanced;
                    }
                }
            }

            i += 1;
        }

        // no row matched: roll back the most recent speculative call, if any
        if let Some(checkpoint) = self.try_stack.pop() {
            self.state = checkpoint.state;
            self.pos = checkpoint.pos;
            self.consumed_len = checkpoint.consumed_len;
            self.return_stack.truncate(checkpoint.return_len);
            self.collector.truncate(checkpoint.collector_len);
            self.ws_matched = checkpoint.ws_matched;
            return Step::Resume(checkpoint.row + 1);
        }

        // hard failure: tag the lexeme, reset, keep going
        self.lexemes[self.pos].class = Some(ERROR_CLASS.to_string());
        self.error_at = Some(self.pos);
        self.consume(true);
        self.state = 0;
        self.return_stack.clear();
        self.try_stack.clear();
        self.ws_matched = false;
        Step::Recovered
    }

    /// Apply a taken row: stack push, state move, pop-chain resolution
    fn take(&mut self, row: &TransitionRow) {
        if let Some(push) = row.push {
            self.return_stack.push(push);
        }
        self.state = row.next;
        // next == 0 is the pop signal; zero entries on the stack chain pops
        while self.state == 0 {
            match self.return_stack.pop() {
                Some(state) => self.state = state,
                None => break,
            }
        }
        // once the stack has shrunk back past a marker's frame, its callee
        // has returned; the checkpoint is committed and no longer eligible
        // for rollback
        while self
            .try_stack
            .last()
            .is_some_and(|checkpoint| self.return_stack.len() <= checkpoint.return_len)
        {
            self.try_stack.pop();
        }
    }

    /// Consume the current lexeme; `advance` also counts it as real progress
    fn consume(&mut self, advance: bool) {
        let lexeme = &self.lexemes[self.pos];
        self.ws_matched = lexeme.kind == LexemeKind::Whitespace;
        if advance {
            self.consumed_len += lexeme.value.chars().count();
        }
        self.pos += 1;
    }

    /// Stamp class and collect semantics for the lexeme about to be consumed
    fn claim(&mut self, class: Option<&str>, semantic: Option<&str>) {
        let lexeme = &mut self.lexemes[self.pos];
        if let Some(class) = class {
            // last writer wins
            lexeme.class = Some(class.to_string());
        }
        match semantic {
            Some(semantic) => self.collector.push(CollectedFragment::Typed {
                semantic: semantic.to_string(),
                value: lexeme.value.clone(),
            }),
            None => {
                if self.collector.last() != Some(&CollectedFragment::Separator) {
                    self.collector.push(CollectedFragment::Separator);
                }
            }
        }
    }

    fn current_kind(&self) -> LexemeKind {
        self.lexemes[self.pos].kind
    }

    /// Record the suggest state when the cursor sits inside the lexeme that is
    /// about to be matched
    ///
    /// Called at every scan restart for a position, so epsilon descents into
    /// callees overwrite the capture with the innermost valid context. Once an
    /// error has occurred nothing is captured anymore.
    fn capture_suggest(&mut self) {
        if self.error_at.is_some() {
            return;
        }
        let lexeme = &self.lexemes[self.pos];
        if self.cursor > lexeme.span.start && self.cursor <= lexeme.span.end {
            let prefix_len = self.cursor - lexeme.span.start;
            let prefix: String = lexeme.value.chars().take(prefix_len).collect();
            self.suggest = (self.state, prefix);
            self.captured = true;
        }
    }
}
