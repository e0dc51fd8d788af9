//! Table compiler - turns rule chains into the shared automaton table
//!
//! The compiler owns the growable table and the rule-name registry; nothing is
//! process-global. Compilation walks a chain left to right keeping two patch
//! lists of row handles:
//!
//! - *pending-next*: rows whose target state is not yet known ("what comes
//!   after this element")
//! - *pending-push*: rows whose return-stack push is not yet known (call rows,
//!   whose continuation state only exists once the next element is processed)
//!
//! Each primitive element flushes both lists to a freshly allocated state and
//! leaves its own rows pending. `Exit` flushes both lists to state 0 (the
//! universal pop state); `Merge` flushes them to the nearest open `Branch`
//! label, forming a loop. A chain that ends with either list still populated
//! never reached a terminator and is rejected.
//!
//! Rule name resolution is lazy: the first reference to a name allocates its
//! entry state, so forward references across mutually recursive rules are
//! legal. `finish` verifies every referenced rule was eventually defined.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::chain::{Chain, ChainElement};
use super::table::{AutomatonTable, Matcher, RowHandle, StateId, TransitionRow};
use super::Grammar;
use crate::error::GrammarError;

/// Rows awaiting resolution of their target or stack push
#[derive(Debug, Default)]
struct Pending {
    next: Vec<RowHandle>,
    push: Vec<RowHandle>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.next.is_empty() && self.push.is_empty()
    }

    fn extend(&mut self, other: Pending) {
        self.next.extend(other.next);
        self.push.extend(other.push);
    }
}

/// Grammar compiler owning the table and the rule registry
#[derive(Debug, Default)]
pub struct Compiler {
    table: AutomatonTable,
    registry: HashMap<String, StateId>,
    defined: HashSet<String>,
    referenced: HashSet<String>,
}

impl Compiler {
    /// Create a compiler with an empty table
    pub fn new() -> Self {
        Self {
            table: AutomatonTable::new(),
            registry: HashMap::new(),
            defined: HashSet::new(),
            referenced: HashSet::new(),
        }
    }

    /// Compile one named rule from its chain
    ///
    /// The chain must have been closed by `exit` or `merge`; every path through
    /// it must reach a terminator. Either violation is fatal: there is no
    /// partially compiled grammar.
    pub fn rule(&mut self, name: &str, chain: Chain) -> Result<&mut Self, GrammarError> {
        if !chain.is_closed() {
            return Err(GrammarError::ChainNotClosed(name.to_string()));
        }
        if !self.defined.insert(name.to_string()) {
            return Err(GrammarError::DuplicateRule(name.to_string()));
        }

        let entry = self.rule_state(name);
        let mut labels = Vec::new();
        let leftover = self.compile_chain(name, &chain.elements, entry, &mut labels)?;
        if !leftover.is_empty() {
            return Err(GrammarError::UnterminatedChain(name.to_string()));
        }

        debug!(rule = name, states = self.table.len(), "compiled rule");
        Ok(self)
    }

    /// Seal the grammar, checking that every `call`/`try_call` target exists
    pub fn finish(self) -> Result<Grammar, GrammarError> {
        for name in &self.referenced {
            if !self.defined.contains(name) {
                return Err(GrammarError::UndefinedRule(name.clone()));
            }
        }
        Ok(Grammar::new(self.table, self.registry))
    }

    /// Entry state of a rule, allocated on first reference
    fn rule_state(&mut self, name: &str) -> StateId {
        self.referenced.insert(name.to_string());
        if let Some(&state) = self.registry.get(name) {
            return state;
        }
        let state = self.table.alloc_state();
        self.registry.insert(name.to_string(), state);
        state
    }

    /// Compile a chain (or split alternative) starting at `start`
    ///
    /// Returns whatever pending rows are still open when the elements run out;
    /// for a split alternative these merge into the parent, for a top-level
    /// chain they mean the chain is malformed.
    fn compile_chain(
        &mut self,
        rule: &str,
        elements: &[ChainElement],
        start: StateId,
        labels: &mut Vec<StateId>,
    ) -> Result<Pending, GrammarError> {
        let mut current = start;
        let mut pending = Pending::default();
        let mut produced_rows = false;

        for element in elements {
            match element {
                ChainElement::Literal { kind, specs } => {
                    self.flush(&mut current, &mut pending);
                    for spec in specs {
                        let handle = self.append(
                            current,
                            Matcher::Literal {
                                kind: *kind,
                                spec: spec.clone(),
                            },
                        );
                        pending.next.push(handle);
                    }
                    produced_rows = true;
                }
                ChainElement::OptionalWhitespace => {
                    self.flush(&mut current, &mut pending);
                    let handle = self.append(current, Matcher::OptionalWhitespace);
                    pending.next.push(handle);
                    produced_rows = true;
                }
                ChainElement::Any => {
                    self.flush(&mut current, &mut pending);
                    let handle = self.append(current, Matcher::MatchAny { advance: false });
                    pending.next.push(handle);
                    produced_rows = true;
                }
                ChainElement::MatchAll => {
                    self.flush(&mut current, &mut pending);
                    let handle = self.append(current, Matcher::MatchAny { advance: true });
                    pending.next.push(handle);
                    produced_rows = true;
                }
                ChainElement::MatchNone => {
                    self.flush(&mut current, &mut pending);
                    let handle = self.append(current, Matcher::Fail);
                    pending.next.push(handle);
                    produced_rows = true;
                }
                ChainElement::Branch => {
                    // materialize the label state so merge can loop back to it
                    self.flush(&mut current, &mut pending);
                    labels.push(current);
                }
                ChainElement::Merge => {
                    let label = labels
                        .pop()
                        .ok_or_else(|| GrammarError::UnmatchedMerge(rule.to_string()))?;
                    if pending.is_empty() && !produced_rows {
                        // empty sub-chain: jump to the label unconditionally
                        self.table.push_row(
                            current,
                            TransitionRow {
                                matcher: Matcher::Epsilon,
                                next: label,
                                push: None,
                            },
                        );
                    }
                    for handle in pending.next.drain(..) {
                        self.table.patch_next(handle, label);
                    }
                    for handle in pending.push.drain(..) {
                        self.table.patch_push(handle, label);
                    }
                    return Ok(pending);
                }
                ChainElement::Split(alternatives) => {
                    self.flush(&mut current, &mut pending);
                    let mut union = Pending::default();
                    for alternative in alternatives {
                        let open =
                            self.compile_chain(rule, &alternative.elements, current, labels)?;
                        union.extend(open);
                    }
                    pending = union;
                    produced_rows = true;
                }
                ChainElement::Call(name) => {
                    self.compile_call(name, false, &mut current, &mut pending)?;
                    produced_rows = true;
                }
                ChainElement::TryCall(name) => {
                    self.compile_call(name, true, &mut current, &mut pending)?;
                    produced_rows = true;
                }
                ChainElement::Exit => {
                    if pending.is_empty() && !produced_rows {
                        // empty sub-chain: pop back to the caller unconditionally
                        self.table.push_row(
                            current,
                            TransitionRow {
                                matcher: Matcher::Epsilon,
                                next: 0,
                                push: None,
                            },
                        );
                    }
                    for handle in pending.next.drain(..) {
                        self.table.patch_next(handle, 0);
                    }
                    for handle in pending.push.drain(..) {
                        self.table.patch_push(handle, 0);
                    }
                    return Ok(pending);
                }
            }
        }

        Ok(pending)
    }

    /// Compile a `call`/`try_call` element
    ///
    /// Pending-next rows are retargeted straight at the callee's entry state;
    /// their stack pushes stay pending until the continuation state exists.
    /// Pending-push rows (call-ending paths, which may coexist with
    /// pending-next ones after a `Split`) return into a fresh state holding a
    /// synthetic row that performs this call. With nothing pending at all the
    /// synthetic row lands on the current state: `Epsilon` for a plain call,
    /// `TryMarker` for a speculative one.
    fn compile_call(
        &mut self,
        name: &str,
        speculative: bool,
        current: &mut StateId,
        pending: &mut Pending,
    ) -> Result<(), GrammarError> {
        let callee = self.rule_state(name);

        if speculative && !pending.next.is_empty() {
            // no defined semantics for rolling back rows that already
            // matched; reject instead of guessing
            return Err(GrammarError::SpeculativeCallAfterMatch(name.to_string()));
        }

        if pending.is_empty() {
            // a call opening a chain or a split alternative
            let handle = self.synthetic_call_row(*current, callee, speculative);
            pending.push.push(handle);
            return Ok(());
        }

        if !pending.push.is_empty() {
            // call-ending paths return into a fresh state holding this
            // call's synthetic row
            let continuation = self.table.alloc_state();
            for handle in pending.push.drain(..) {
                self.table.patch_push(handle, continuation);
            }
            let handle = self.synthetic_call_row(continuation, callee, speculative);
            pending.push.push(handle);
            *current = continuation;
        }

        // matched rows jump straight into the callee
        for handle in std::mem::take(&mut pending.next) {
            self.table.patch_next(handle, callee);
            pending.push.push(handle);
        }

        Ok(())
    }

    fn synthetic_call_row(
        &mut self,
        state: StateId,
        callee: StateId,
        speculative: bool,
    ) -> RowHandle {
        let matcher = if speculative {
            Matcher::TryMarker
        } else {
            Matcher::Epsilon
        };
        self.table.push_row(
            state,
            TransitionRow {
                matcher,
                next: callee,
                push: None,
            },
        )
    }

    /// Resolve all pending rows to a freshly allocated state
    fn flush(&mut self, current: &mut StateId, pending: &mut Pending) {
        if pending.is_empty() {
            return;
        }
        let state = self.table.alloc_state();
        for handle in pending.next.drain(..) {
            self.table.patch_next(handle, state);
        }
        for handle in pending.push.drain(..) {
            self.table.patch_push(handle, state);
        }
        *current = state;
    }

    fn append(&mut self, state: StateId, matcher: Matcher) -> RowHandle {
        self.table.push_row(
            state,
            TransitionRow {
                matcher,
                next: 0,
                push: None,
            },
        )
    }
}

/// Convenience: compile a single-rule grammar
pub fn compile_rule(name: &str, chain: Chain) -> Result<Grammar, GrammarError> {
    let mut compiler = Compiler::new();
    compiler.rule(name, chain)?;
    compiler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::chain::chain;
    use crate::grammar::lexer::LexemeKind;
    use crate::grammar::table::MatchSpec;

    #[test]
    fn test_simple_rule_layout() {
        let mut compiler = Compiler::new();
        compiler
            .rule(
                "cmd",
                chain()
                    .id(["w", "write"])
                    .ws()
                    .constant(MatchSpec::default())
                    .exit(),
            )
            .unwrap();
        let grammar = compiler.finish().unwrap();

        let entry = grammar.start_state("cmd").unwrap();
        let rows = grammar.table().rows(entry);
        // two sibling identifier rows for the value alternatives
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].next, rows[1].next);
        assert_ne!(rows[0].next, 0);

        // whitespace state flows into the constant state, which exits
        let ws_rows = grammar.table().rows(rows[0].next);
        assert_eq!(ws_rows.len(), 1);
        let const_rows = grammar.table().rows(ws_rows[0].next);
        assert_eq!(const_rows.len(), 1);
        assert_eq!(const_rows[0].next, 0);
    }

    #[test]
    fn test_unclosed_chain_is_rejected() {
        let mut compiler = Compiler::new();
        let err = compiler.rule("cmd", chain().id("w").ws()).unwrap_err();
        assert!(matches!(err, GrammarError::ChainNotClosed(name) if name == "cmd"));
    }

    #[test]
    fn test_unmatched_merge_is_rejected() {
        let mut compiler = Compiler::new();
        let err = compiler.rule("cmd", chain().id("w").merge()).unwrap_err();
        assert!(matches!(err, GrammarError::UnmatchedMerge(name) if name == "cmd"));
    }

    #[test]
    fn test_duplicate_rule_is_rejected() {
        let mut compiler = Compiler::new();
        compiler.rule("cmd", chain().id("w").exit()).unwrap();
        let err = compiler.rule("cmd", chain().id("s").exit()).unwrap_err();
        assert!(matches!(err, GrammarError::DuplicateRule(_)));
    }

    #[test]
    fn test_undefined_call_target_is_rejected_at_finish() {
        let mut compiler = Compiler::new();
        compiler
            .rule("cmd", chain().id("w").call("missing").exit())
            .unwrap();
        let err = compiler.finish().unwrap_err();
        assert!(matches!(err, GrammarError::UndefinedRule(name) if name == "missing"));
    }

    #[test]
    fn test_forward_reference_is_legal() {
        let mut compiler = Compiler::new();
        compiler
            .rule("cmd", chain().id("w").call("arg").exit())
            .unwrap();
        compiler
            .rule("arg", chain().constant(MatchSpec::default()).exit())
            .unwrap();
        assert!(compiler.finish().is_ok());
    }

    #[test]
    fn test_mutual_recursion_is_legal() {
        let mut compiler = Compiler::new();
        compiler
            .rule(
                "a",
                chain()
                    .split([chain().char("(").call("b").exit(), chain().id("x").exit()])
                    .exit(),
            )
            .unwrap();
        compiler
            .rule("b", chain().call("a").char(")").exit())
            .unwrap();
        assert!(compiler.finish().is_ok());
    }

    #[test]
    fn test_branch_merge_forms_loop() {
        let grammar = compile_rule(
            "list",
            chain()
                .constant(MatchSpec::default())
                .branch()
                .split([
                    chain().char(",").constant(MatchSpec::default()).merge(),
                    chain().exit(),
                ])
                .exit(),
        )
        .unwrap();

        let entry = grammar.start_state("list").unwrap();
        let loop_state = grammar.table().rows(entry)[0].next;
        // comma row, then the exit fallthrough
        let rows = grammar.table().rows(loop_state);
        assert_eq!(rows.len(), 2);
        // the constant inside the loop points back at the label state
        let comma_next = rows[0].next;
        assert_eq!(grammar.table().rows(comma_next)[0].next, loop_state);
        // the empty alternative pops back to the caller
        assert_eq!(rows[1].matcher, Matcher::Epsilon);
        assert_eq!(rows[1].next, 0);
    }

    #[test]
    fn test_call_row_pushes_continuation() {
        let mut compiler = Compiler::new();
        compiler
            .rule(
                "cmd",
                chain()
                    .id("do")
                    .call("sub")
                    .char("!")
                    .exit(),
            )
            .unwrap();
        compiler.rule("sub", chain().constant(MatchSpec::default()).exit()).unwrap();
        let grammar = compiler.finish().unwrap();

        let entry = grammar.start_state("cmd").unwrap();
        let id_row = &grammar.table().rows(entry)[0];
        // the identifier row was retargeted at the callee and pushes the
        // continuation holding the '!' row
        assert_eq!(id_row.next, grammar.start_state("sub").unwrap());
        let continuation = id_row.push.expect("call must push a continuation");
        let bang = &grammar.table().rows(continuation)[0];
        assert!(matches!(
            &bang.matcher,
            Matcher::Literal { kind: LexemeKind::Char, spec } if spec.value.as_deref() == Some("!")
        ));
    }

    #[test]
    fn test_call_as_first_element_synthesizes_epsilon() {
        let mut compiler = Compiler::new();
        compiler
            .rule("cmd", chain().call("sub").char("!").exit())
            .unwrap();
        compiler.rule("sub", chain().id("x").exit()).unwrap();
        let grammar = compiler.finish().unwrap();

        let entry = grammar.start_state("cmd").unwrap();
        let row = &grammar.table().rows(entry)[0];
        assert_eq!(row.matcher, Matcher::Epsilon);
        assert_eq!(row.next, grammar.start_state("sub").unwrap());
        assert!(row.push.is_some());
    }

    #[test]
    fn test_chained_calls_return_through_fresh_states() {
        let mut compiler = Compiler::new();
        compiler
            .rule("cmd", chain().call("a").call("b").exit())
            .unwrap();
        compiler.rule("a", chain().id("a").exit()).unwrap();
        compiler.rule("b", chain().id("b").exit()).unwrap();
        let grammar = compiler.finish().unwrap();

        let entry = grammar.start_state("cmd").unwrap();
        let first = &grammar.table().rows(entry)[0];
        let continuation = first.push.unwrap();
        let second = &grammar.table().rows(continuation)[0];
        assert_eq!(second.next, grammar.start_state("b").unwrap());
        // the final call returns straight into a pop
        assert_eq!(second.push, Some(0));
    }

    #[test]
    fn test_call_after_mixed_split_reaches_both_paths() {
        // one alternative ends on a matched row, the other on a call; the
        // following call must wire a continuation for both
        let mut compiler = Compiler::new();
        compiler
            .rule(
                "cmd",
                chain()
                    .split([chain().id("z"), chain().call("a")])
                    .call("b")
                    .exit(),
            )
            .unwrap();
        compiler.rule("a", chain().char("!").exit()).unwrap();
        compiler.rule("b", chain().char("?").exit()).unwrap();
        let grammar = compiler.finish().unwrap();

        assert_eq!(grammar.parse("z?", 0, false, "cmd").unwrap().error_at, None);
        assert_eq!(grammar.parse("!?", 0, false, "cmd").unwrap().error_at, None);
    }

    #[test]
    fn test_try_call_after_match_is_rejected() {
        let mut compiler = Compiler::new();
        let err = compiler
            .rule("cmd", chain().id("w").try_call("sub").exit())
            .unwrap_err();
        assert!(matches!(err, GrammarError::SpeculativeCallAfterMatch(_)));
    }

    #[test]
    fn test_try_call_opening_alternative_emits_marker() {
        let mut compiler = Compiler::new();
        compiler
            .rule(
                "cmd",
                chain()
                    .split([
                        chain().try_call("a").char(":").exit(),
                        chain().call("c").exit(),
                    ])
                    .exit(),
            )
            .unwrap();
        compiler.rule("a", chain().id("a").exit()).unwrap();
        compiler.rule("c", chain().id("c").exit()).unwrap();
        let grammar = compiler.finish().unwrap();

        let entry = grammar.start_state("cmd").unwrap();
        let rows = grammar.table().rows(entry);
        assert_eq!(rows[0].matcher, Matcher::TryMarker);
        assert_eq!(rows[1].matcher, Matcher::Epsilon);
    }

    #[test]
    fn test_exit_on_empty_chain_pops() {
        let grammar = compile_rule("empty", chain().exit()).unwrap();
        let entry = grammar.start_state("empty").unwrap();
        let rows = grammar.table().rows(entry);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].matcher, Matcher::Epsilon);
        assert_eq!(rows[0].next, 0);
    }

    #[test]
    fn test_split_alternatives_share_entry_state() {
        let grammar = compile_rule(
            "term",
            chain()
                .split([
                    chain().constant(MatchSpec::default()).exit(),
                    chain().string(MatchSpec::default()).exit(),
                    chain().id_any(MatchSpec::default()).exit(),
                ])
                .exit(),
        )
        .unwrap();
        let entry = grammar.start_state("term").unwrap();
        assert_eq!(grammar.table().rows(entry).len(), 3);
    }
}
