//! Semantic candidate providers for autocomplete
//!
//! The grammar knows the shape of the input; providers know the names. When a
//! suggestion slot carries a semantic type instead of literal text (a function
//! name, a namespace), the completer asks a provider to fill it in. The parse
//! collector is passed along so a provider can narrow candidates by what was
//! already typed on the line.

use std::collections::HashMap;

use crate::grammar::CollectedFragment;

/// Source of completion candidates for semantically typed slots
pub trait SemanticProvider: Send + Sync {
    /// Candidates of the given semantic type matching `prefix`
    fn candidates(
        &self,
        semantic: &str,
        prefix: &str,
        context: &[CollectedFragment],
    ) -> Vec<String>;
}

/// Provider backed by fixed in-memory lists
///
/// The stand-in for a protocol-backed provider; a connected session would
/// replace this with one that queries the server for classes and globals.
#[derive(Debug, Default)]
pub struct StaticProvider {
    entries: HashMap<String, Vec<String>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider preloaded with the intrinsic names every session knows
    pub fn with_defaults() -> Self {
        let mut provider = Self::new();
        provider.insert(
            "function",
            [
                "ascii", "char", "data", "extract", "find", "get", "horolog", "justify",
                "length", "order", "piece", "random", "reverse", "translate", "zversion",
            ],
        );
        provider.insert("namespace", ["USER", "SAMPLES", "DOCBOOK"]);
        provider
    }

    /// Register candidates for a semantic type
    pub fn insert<I, S>(&mut self, semantic: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(semantic.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }
}

impl SemanticProvider for StaticProvider {
    fn candidates(
        &self,
        semantic: &str,
        prefix: &str,
        _context: &[CollectedFragment],
    ) -> Vec<String> {
        let Some(values) = self.entries.get(semantic) else {
            return Vec::new();
        };
        values
            .iter()
            .filter(|v| v.len() > prefix.len() && v.starts_with(prefix))
            .cloned()
            .collect()
    }
}
