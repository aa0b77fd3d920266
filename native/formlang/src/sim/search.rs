//! Breadth-first configuration search with a resumable safety bound.

use super::Simulator;
use super::configuration::Configuration;
use crate::error::{Error, Result};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// Index of a configuration in a [`Search`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(usize);

impl ConfigId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    config: Configuration,
    parent: Option<ConfigId>,
}

/// How a finished search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The first accepting configuration found, in frontier order.
    Accepted(ConfigId),
    /// The frontier ran dry.
    Rejected,
}

impl Outcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

/// One simulation run, driven a generation at a time.
///
/// Every configuration ever generated stays in the arena so derivation
/// chains can be rebuilt with [`Search::path`]. When the bound is hit the
/// search keeps its frontier, so raising the bound and calling
/// [`Search::run`] again picks up exactly where it stopped.
#[derive(Debug)]
pub struct Search<'a> {
    sim: &'a Simulator,
    arena: Vec<Node>,
    frontier: Vec<ConfigId>,
    /// Next frontier entry to expand.
    cursor: usize,
    next: Vec<ConfigId>,
    /// Whether the current frontier has been tested for acceptance.
    checked: bool,
    seen: HashSet<Configuration>,
    generated: usize,
    bound: usize,
    generation: usize,
    outcome: Option<Outcome>,
}

impl<'a> Search<'a> {
    pub(super) fn new(sim: &'a Simulator, roots: Vec<Configuration>) -> Self {
        let mut search = Self {
            sim,
            arena: Vec::new(),
            frontier: Vec::new(),
            cursor: 0,
            next: Vec::new(),
            checked: false,
            seen: HashSet::new(),
            generated: 0,
            bound: sim.config().bound,
            generation: 0,
            outcome: None,
        };
        for root in roots {
            if let Some(id) = search.admit(root, None) {
                search.frontier.push(id);
            }
        }
        search
    }

    /// Record a configuration unless dedup has seen it before.
    fn admit(&mut self, config: Configuration, parent: Option<ConfigId>) -> Option<ConfigId> {
        if self.sim.config().dedup && !self.seen.insert(config.clone()) {
            trace!("skipping repeated configuration {config}");
            return None;
        }
        let id = ConfigId(self.arena.len());
        self.arena.push(Node { config, parent });
        self.generated += 1;
        Some(id)
    }

    /// Advance by one generation.
    ///
    /// The whole current frontier is tested for acceptance before any of it
    /// is expanded. Returns `Ok(Some(_))` once the run is decided and
    /// `Ok(None)` after moving to the next generation.
    pub fn step_generation(&mut self) -> Result<Option<Outcome>> {
        if let Some(outcome) = self.outcome {
            return Ok(Some(outcome));
        }

        if !self.checked {
            self.checked = true;
            let accepted = self
                .frontier
                .iter()
                .copied()
                .find(|&id| self.sim.is_accepting(&self.arena[id.0].config));
            if let Some(id) = accepted {
                debug!(
                    "accepted in generation {} after {} configurations",
                    self.generation, self.generated
                );
                return Ok(Some(self.finish(Outcome::Accepted(id))));
            }
            if self.frontier.is_empty() {
                debug!(
                    "rejected in generation {} after {} configurations",
                    self.generation, self.generated
                );
                return Ok(Some(self.finish(Outcome::Rejected)));
            }
        }

        while self.cursor < self.frontier.len() {
            if self.generated > self.bound {
                warn!(
                    "search bound {} exceeded with {} configurations generated",
                    self.bound, self.generated
                );
                return Err(Error::SearchBoundExceeded {
                    generated: self.generated,
                    bound: self.bound,
                });
            }
            let parent = self.frontier[self.cursor];
            let children = self.sim.step(&self.arena[parent.0].config);
            for child in children {
                if let Some(id) = self.admit(child, Some(parent)) {
                    self.next.push(id);
                }
            }
            self.cursor += 1;
        }

        self.frontier = std::mem::take(&mut self.next);
        self.cursor = 0;
        self.checked = false;
        self.generation += 1;
        trace!(
            "generation {} has {} configurations",
            self.generation,
            self.frontier.len()
        );
        Ok(None)
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        self.outcome = Some(outcome);
        outcome
    }

    /// Run generations until the search is decided or the bound is hit.
    pub fn run(&mut self) -> Result<Outcome> {
        loop {
            if let Some(outcome) = self.step_generation()? {
                return Ok(outcome);
            }
        }
    }

    /// Allow `extra` more configurations before the next bound check fails.
    pub fn raise_bound(&mut self, extra: usize) {
        self.bound = self.bound.saturating_add(extra);
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn generated(&self) -> usize {
        self.generated
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn get(&self, id: ConfigId) -> Option<&Configuration> {
        self.arena.get(id.0).map(|node| &node.config)
    }

    pub fn parent(&self, id: ConfigId) -> Option<ConfigId> {
        self.arena.get(id.0).and_then(|node| node.parent)
    }

    /// Ids of the configurations in the current generation.
    pub fn frontier(&self) -> &[ConfigId] {
        &self.frontier
    }

    /// The chain from an initial configuration down to `id`, root first.
    pub fn path(&self, id: ConfigId) -> Vec<ConfigId> {
        let mut chain = Vec::new();
        let mut current = Some(id).filter(|id| id.0 < self.arena.len());
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, Transition};
    use crate::config::SearchConfig;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// PDA that pushes forever without reading.
    fn push_loop() -> Automaton {
        let mut pda = Automaton::pda();
        let q0 = pda.add_state();
        pda.set_initial(q0).unwrap();
        pda.add_transition(Transition::pda(q0, q0, "", "", "A")).unwrap();
        pda
    }

    /// FSA for a*, all in one state.
    fn a_star() -> Automaton {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        fsa.set_initial(q0).unwrap();
        fsa.add_final(q0).unwrap();
        fsa.add_transition(Transition::fsa(q0, q0, "a")).unwrap();
        fsa
    }

    #[test]
    fn test_bound_is_reported_not_looped() {
        init();
        let sim = Simulator::new(&push_loop(), SearchConfig::default().with_bound(50)).unwrap();
        let mut search = sim.search("a");
        assert_eq!(
            search.run(),
            Err(Error::SearchBoundExceeded {
                generated: 51,
                bound: 50
            })
        );
        assert!(search.outcome().is_none());

        search.raise_bound(100);
        assert_eq!(
            search.run(),
            Err(Error::SearchBoundExceeded {
                generated: 151,
                bound: 150
            })
        );
    }

    #[test]
    fn test_resume_after_bound_reaches_decision() {
        let sim = Simulator::new(&a_star(), SearchConfig::default().with_bound(2)).unwrap();
        let mut search = sim.search("aaaa");
        let err = search.run().unwrap_err();
        assert!(err.is_search_bound());

        search.raise_bound(10);
        let outcome = search.run().unwrap();
        let Outcome::Accepted(id) = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(search.generation(), 4);

        let path = search.path(id);
        assert_eq!(path.len(), 5);
        let remaining: Vec<&str> = path
            .iter()
            .map(|&node| search.get(node).unwrap().remaining().unwrap())
            .collect();
        assert_eq!(remaining, vec!["aaaa", "aaa", "aa", "a", ""]);
        assert_eq!(search.parent(path[0]), None);
    }

    #[test]
    fn test_step_generation_by_hand() {
        let sim = Simulator::new(&a_star(), SearchConfig::default()).unwrap();
        let mut search = sim.search("aa");
        assert_eq!(search.frontier().len(), 1);
        assert_eq!(search.step_generation().unwrap(), None);
        assert_eq!(search.generation(), 1);
        assert_eq!(search.step_generation().unwrap(), None);
        let outcome = search.step_generation().unwrap();
        assert!(outcome.is_some_and(Outcome::is_accepted));
        // decided searches keep answering the same way
        assert_eq!(search.step_generation().unwrap(), outcome);
    }

    #[test]
    fn test_rejection_when_frontier_empties() {
        let sim = Simulator::new(&a_star(), SearchConfig::default()).unwrap();
        let mut search = sim.search("ab");
        assert_eq!(search.run().unwrap(), Outcome::Rejected);
        assert_eq!(search.generated(), 2);
    }
}
