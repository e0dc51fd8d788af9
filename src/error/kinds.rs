use std::{fmt, io};

/// Crate-wide `Result` type using [`CostermError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, CostermError>;

/// Top-level error type for costerm operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum CostermError {
    /// Grammar compilation errors.
    Grammar(GrammarError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Grammar-compilation errors.
///
/// All of these are authoring mistakes in a rule set; none can be produced
/// by user input at parse time.
#[derive(Debug)]
pub enum GrammarError {
    /// A rule chain was never closed by a terminator.
    ChainNotClosed(String),

    /// A path through a rule chain does not reach a terminator.
    UnterminatedChain(String),

    /// A merge element has no matching branch label.
    UnmatchedMerge(String),

    /// A speculative call follows elements that already matched input.
    SpeculativeCallAfterMatch(String),

    /// The same rule name was compiled twice.
    DuplicateRule(String),

    /// A called rule was never defined.
    UndefinedRule(String),

    /// The requested start rule does not exist in the grammar.
    UnknownStartRule(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for CostermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostermError::Grammar(e) => write!(f, "Grammar error: {e}"),
            CostermError::Config(e) => write!(f, "Configuration error: {e}"),
            CostermError::Io(e) => write!(f, "I/O error: {e}"),
            CostermError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::ChainNotClosed(rule) => {
                write!(f, "Rule '{rule}' is not closed by exit or merge")
            }
            GrammarError::UnterminatedChain(rule) => {
                write!(f, "Rule '{rule}' has a path that never terminates")
            }
            GrammarError::UnmatchedMerge(rule) => {
                write!(f, "Rule '{rule}' merges without an open branch")
            }
            GrammarError::SpeculativeCallAfterMatch(rule) => {
                write!(f, "Speculative call to '{rule}' after a matching element")
            }
            GrammarError::DuplicateRule(rule) => write!(f, "Rule '{rule}' is defined twice"),
            GrammarError::UndefinedRule(rule) => {
                write!(f, "Rule '{rule}' is called but never defined")
            }
            GrammarError::UnknownStartRule(rule) => write!(f, "Unknown start rule: {rule}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for CostermError {}
impl std::error::Error for GrammarError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to CostermError ========================= */

impl From<io::Error> for CostermError {
    fn from(err: io::Error) -> Self {
        CostermError::Io(err)
    }
}

impl From<GrammarError> for CostermError {
    fn from(err: GrammarError) -> Self {
        CostermError::Grammar(err)
    }
}

impl From<ConfigError> for CostermError {
    fn from(err: ConfigError) -> Self {
        CostermError::Config(err)
    }
}

impl From<String> for CostermError {
    fn from(msg: String) -> Self {
        CostermError::Generic(msg)
    }
}

impl From<&str> for CostermError {
    fn from(msg: &str) -> Self {
        CostermError::Generic(msg.to_owned())
    }
}
