//! Error types shared by every operation in the crate.

use crate::automaton::{AutomatonKind, StateId};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Ways an automaton (or a grammar handed to an automaton converter) can be
/// unusable for the requested operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAutomaton {
    #[error("automaton has no initial state")]
    MissingInitialState,
    #[error("transition references state {state} which belongs to another automaton")]
    ForeignState { state: StateId },
    #[error("state {state} does not exist")]
    UnknownState { state: StateId },
    #[error("a {found} payload does not fit a {expected} automaton")]
    KindMismatch {
        expected: AutomatonKind,
        found: AutomatonKind,
    },
    #[error("operation requires a finite state automaton, found {found}")]
    NotFsa { found: AutomatonKind },
    #[error("production {production} is not right-linear")]
    NotRightLinear { production: String },
    #[error("pushdown automaton cannot be read as a grammar: {reason}")]
    NotPdaNormalForm { reason: String },
    #[error("{operation} is not defined for {found} automata")]
    Unsupported {
        operation: &'static str,
        found: AutomatonKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid automaton: {0}")]
    InvalidAutomaton(#[from] InvalidAutomaton),

    /// The search generated more configurations than allowed. The search that
    /// produced this error can be resumed after raising its bound.
    #[error("generated {generated} configurations without a decision (bound {bound})")]
    SearchBoundExceeded { generated: usize, bound: usize },

    #[error("conflict in table row {row} on {symbol:?}: {existing} vs {incoming}")]
    GrammarConflict {
        row: String,
        symbol: char,
        existing: String,
        incoming: String,
    },

    #[error("malformed production {production:?}: {reason}")]
    MalformedProduction { production: String, reason: String },

    #[error("all single-letter variables are in use")]
    NoFreeVariable,

    #[error("malformed regular expression {expression:?}: {reason}")]
    MalformedExpression { expression: String, reason: String },
}

impl Error {
    pub fn is_search_bound(&self) -> bool {
        matches!(self, Error::SearchBoundExceeded { .. })
    }
}

#[cfg(feature = "python")]
impl From<Error> for pyo3::PyErr {
    fn from(err: Error) -> Self {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err {
            Error::SearchBoundExceeded { .. } => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}
