//! Grammar DSL - fluent chain builder
//!
//! A chain is the ordered list of match elements describing one rule's shape.
//! The builder only assembles; all validation is deferred to the compiler, so
//! the only authoring mistake expressible here is "chain never closed", which
//! the compiler reports as [`GrammarError::ChainNotClosed`].
//!
//! [`GrammarError::ChainNotClosed`]: crate::error::GrammarError::ChainNotClosed
//!
//! Closing a chain with a terminal element (`exit` or `merge`) is idempotent:
//! further builder calls on a closed chain are no-ops.

use super::lexer::LexemeKind;
use super::table::MatchSpec;

/// One element of a rule chain
#[derive(Debug, Clone, PartialEq)]
pub enum ChainElement {
    /// Match one lexeme of `kind`; sibling specs expand into sibling rows at
    /// the same state, tried in declaration order
    Literal {
        kind: LexemeKind,
        specs: Vec<MatchSpec>,
    },
    /// Whitespace that may be absent
    OptionalWhitespace,
    /// Catch-all that matches when nothing above it does, without counting the
    /// lexeme as real progress
    Any,
    /// Unconditional match that consumes the current lexeme
    MatchAll,
    /// Unconditional dead end
    MatchNone,
    /// Open a loop label at the current position
    Branch,
    /// Close the chain by looping back to the nearest open label
    Merge,
    /// Parallel alternation; alternatives are compiled from the same state and
    /// tried in declaration order
    Split(Vec<Chain>),
    /// Sub-rule invocation; must succeed before the chain continues
    Call(String),
    /// Speculative sub-rule invocation; failure rolls back and falls through
    TryCall(String),
    /// Close the chain, returning control to the caller
    Exit,
}

/// Ordered sequence of chain elements plus the closed flag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub(crate) elements: Vec<ChainElement>,
    pub(crate) closed: bool,
}

/// Start a new, empty chain
pub fn chain() -> Chain {
    Chain::default()
}

/// Values accepted by the literal builder methods: a bare value, a normalized
/// [`MatchSpec`], or an array of either (expanding into sibling rows)
pub trait IntoSpecs {
    fn into_specs(self) -> Vec<MatchSpec>;
}

impl IntoSpecs for &str {
    fn into_specs(self) -> Vec<MatchSpec> {
        vec![MatchSpec::exact(self)]
    }
}

impl IntoSpecs for String {
    fn into_specs(self) -> Vec<MatchSpec> {
        vec![MatchSpec::exact(self)]
    }
}

impl IntoSpecs for MatchSpec {
    fn into_specs(self) -> Vec<MatchSpec> {
        vec![self]
    }
}

impl<const N: usize> IntoSpecs for [&str; N] {
    fn into_specs(self) -> Vec<MatchSpec> {
        self.into_iter().map(MatchSpec::exact).collect()
    }
}

impl<const N: usize> IntoSpecs for [MatchSpec; N] {
    fn into_specs(self) -> Vec<MatchSpec> {
        self.into()
    }
}

impl IntoSpecs for Vec<MatchSpec> {
    fn into_specs(self) -> Vec<MatchSpec> {
        self
    }
}

impl Chain {
    fn push(mut self, element: ChainElement) -> Self {
        if !self.closed {
            self.elements.push(element);
        }
        self
    }

    fn close(mut self, element: ChainElement) -> Self {
        if !self.closed {
            self.elements.push(element);
            self.closed = true;
        }
        self
    }

    /// Match a single character lexeme
    pub fn char(self, specs: impl IntoSpecs) -> Self {
        self.push(ChainElement::Literal {
            kind: LexemeKind::Char,
            specs: specs.into_specs(),
        })
    }

    /// Match an identifier by exact value
    pub fn id(self, specs: impl IntoSpecs) -> Self {
        self.push(ChainElement::Literal {
            kind: LexemeKind::Identifier,
            specs: specs.into_specs(),
        })
    }

    /// Match any identifier, optionally tagged
    pub fn id_any(self, spec: MatchSpec) -> Self {
        self.push(ChainElement::Literal {
            kind: LexemeKind::Identifier,
            specs: vec![MatchSpec {
                value: None,
                ..spec
            }],
        })
    }

    /// Match any string literal
    pub fn string(self, spec: MatchSpec) -> Self {
        self.push(ChainElement::Literal {
            kind: LexemeKind::Str,
            specs: vec![MatchSpec {
                value: None,
                ..spec
            }],
        })
    }

    /// Match any numeric constant
    pub fn constant(self, spec: MatchSpec) -> Self {
        self.push(ChainElement::Literal {
            kind: LexemeKind::Constant,
            specs: vec![MatchSpec {
                value: None,
                ..spec
            }],
        })
    }

    /// Match required whitespace
    pub fn ws(self) -> Self {
        self.push(ChainElement::Literal {
            kind: LexemeKind::Whitespace,
            specs: vec![MatchSpec::default()],
        })
    }

    /// Match optional whitespace
    pub fn opt_ws(self) -> Self {
        self.push(ChainElement::OptionalWhitespace)
    }

    /// Catch-all: matches when nothing else does
    pub fn any(self) -> Self {
        self.push(ChainElement::Any)
    }

    /// Unconditionally match and consume the current lexeme
    pub fn all(self) -> Self {
        self.push(ChainElement::MatchAll)
    }

    /// Unconditional dead end
    pub fn none(self) -> Self {
        self.push(ChainElement::MatchNone)
    }

    /// Open a loop label
    pub fn branch(self) -> Self {
        self.push(ChainElement::Branch)
    }

    /// Loop back to the nearest open label; closes the chain
    pub fn merge(self) -> Self {
        self.close(ChainElement::Merge)
    }

    /// Parallel alternation over fully built sub-chains
    pub fn split(self, alternatives: impl IntoIterator<Item = Chain>) -> Self {
        self.push(ChainElement::Split(alternatives.into_iter().collect()))
    }

    /// Invoke a sub-rule; forward references are legal
    pub fn call(self, rule: impl Into<String>) -> Self {
        self.push(ChainElement::Call(rule.into()))
    }

    /// Speculatively invoke a sub-rule; failure is recoverable
    pub fn try_call(self, rule: impl Into<String>) -> Self {
        self.push(ChainElement::TryCall(rule.into()))
    }

    /// Terminate the chain; closes it
    pub fn exit(self) -> Self {
        self.close(ChainElement::Exit)
    }

    /// Whether a terminal element closed this chain
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
