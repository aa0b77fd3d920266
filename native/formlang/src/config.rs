//! Knobs for the configuration search engine.

use serde::{Deserialize, Serialize};

/// Configurations generated before a search stops to ask the caller.
pub const DEFAULT_SEARCH_BOUND: usize = 10_000;

/// How a pushdown automaton decides acceptance once its input is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceMode {
    /// Current state is final.
    #[default]
    FinalState,
    /// Stack is empty.
    EmptyStack,
    /// Current state is final and the stack is empty.
    FinalStateAndEmptyStack,
}

/// Settings for a single simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of configurations generated before the search reports
    /// `SearchBoundExceeded`.
    pub bound: usize,
    /// Only consulted by pushdown automata.
    pub acceptance: AcceptanceMode,
    /// Skip configurations already seen in this run.
    pub dedup: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bound: DEFAULT_SEARCH_BOUND,
            acceptance: AcceptanceMode::default(),
            dedup: true,
        }
    }
}

impl SearchConfig {
    pub fn with_bound(mut self, bound: usize) -> Self {
        self.bound = bound;
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceMode) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}
