//! Automaton graph model shared by every algorithm in the crate.
//!
//! An [`Automaton`] owns its states and transitions. It is freely mutable
//! while a collaborator builds it, and every algorithm that must not observe
//! later edits clones it on entry.

mod state;
pub mod symbol;
mod transition;

pub use state::{Point, State, StateId, StateSet};
pub use transition::{Direction, Label, Transition};

use crate::error::{InvalidAutomaton, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of machine kinds the crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomatonKind {
    Fsa,
    Pda,
    Turing,
}

impl fmt::Display for AutomatonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AutomatonKind::Fsa => "finite state",
            AutomatonKind::Pda => "pushdown",
            AutomatonKind::Turing => "Turing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Automaton {
    kind: AutomatonKind,
    /// States keyed by id, in creation order.
    states: IndexMap<StateId, State>,
    transitions: Vec<Transition>,
    initial: Option<StateId>,
    finals: StateSet,
    /// What a pushdown automaton's stack holds before the first move, top
    /// first.
    initial_stack: String,
    next_id: StateId,
}

impl Automaton {
    pub fn new(kind: AutomatonKind) -> Self {
        Self {
            kind,
            states: IndexMap::new(),
            transitions: Vec::new(),
            initial: None,
            finals: StateSet::default(),
            initial_stack: String::new(),
            next_id: 0,
        }
    }

    pub fn fsa() -> Self {
        Self::new(AutomatonKind::Fsa)
    }

    pub fn pda() -> Self {
        Self::new(AutomatonKind::Pda)
    }

    pub fn turing() -> Self {
        Self::new(AutomatonKind::Turing)
    }

    pub fn kind(&self) -> AutomatonKind {
        self.kind
    }

    /// Create a state at the given layout position and return its id.
    pub fn create_state(&mut self, point: Point) -> StateId {
        let id = self.next_id;
        self.next_id += 1;
        self.states.insert(
            id,
            State {
                id,
                label: None,
                point,
            },
        );
        id
    }

    /// Create a state with no particular position.
    pub fn add_state(&mut self) -> StateId {
        self.create_state(Point::default())
    }

    /// Create a labeled state with no particular position.
    pub fn add_labeled_state(&mut self, label: impl Into<String>) -> StateId {
        let id = self.add_state();
        if let Some(state) = self.states.get_mut(&id) {
            state.label = Some(label.into());
        }
        id
    }

    pub fn set_label(&mut self, id: StateId, label: Option<String>) -> Result<()> {
        let state = self
            .states
            .get_mut(&id)
            .ok_or(InvalidAutomaton::UnknownState { state: id })?;
        state.label = label;
        Ok(())
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    /// States in creation order.
    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.values()
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.keys().copied()
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Display name of a state, `q{id}` for unknown or unlabeled states.
    pub fn state_name(&self, id: StateId) -> String {
        self.states
            .get(&id)
            .map_or_else(|| format!("q{id}"), State::name)
    }

    /// Remove a state together with every transition touching it.
    pub fn remove_state(&mut self, id: StateId) -> Result<State> {
        let state = self
            .states
            .shift_remove(&id)
            .ok_or(InvalidAutomaton::UnknownState { state: id })?;
        self.transitions.retain(|t| t.from != id && t.to != id);
        self.finals.remove(id);
        if self.initial == Some(id) {
            self.initial = None;
        }
        Ok(state)
    }

    pub fn set_initial(&mut self, id: StateId) -> Result<()> {
        self.require_state(id)?;
        self.initial = Some(id);
        Ok(())
    }

    pub fn clear_initial(&mut self) {
        self.initial = None;
    }

    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    /// The initial state, or `MissingInitialState`.
    pub fn require_initial(&self) -> Result<StateId> {
        Ok(self.initial.ok_or(InvalidAutomaton::MissingInitialState)?)
    }

    pub fn add_final(&mut self, id: StateId) -> Result<()> {
        self.require_state(id)?;
        self.finals.insert(id);
        Ok(())
    }

    pub fn remove_final(&mut self, id: StateId) -> Result<()> {
        self.require_state(id)?;
        self.finals.remove(id);
        Ok(())
    }

    pub fn is_final(&self, id: StateId) -> bool {
        self.finals.contains(id)
    }

    pub fn finals(&self) -> &StateSet {
        &self.finals
    }

    /// Seed the stack of every run, top first. Pushdown automata start with
    /// an empty stack unless this is set.
    pub fn set_initial_stack(&mut self, contents: impl Into<String>) -> Result<()> {
        if self.kind != AutomatonKind::Pda {
            return Err(InvalidAutomaton::Unsupported {
                operation: "an initial stack",
                found: self.kind,
            }
            .into());
        }
        self.initial_stack = contents.into();
        Ok(())
    }

    pub fn initial_stack(&self) -> &str {
        &self.initial_stack
    }

    /// Add a transition. Both endpoints must be states of this automaton and
    /// the payload must match the automaton's kind. Adding an identical
    /// transition twice is a no-op.
    pub fn add_transition(&mut self, transition: Transition) -> Result<()> {
        if transition.kind() != self.kind {
            return Err(InvalidAutomaton::KindMismatch {
                expected: self.kind,
                found: transition.kind(),
            }
            .into());
        }
        for endpoint in [transition.from, transition.to] {
            if !self.contains_state(endpoint) {
                return Err(InvalidAutomaton::ForeignState { state: endpoint }.into());
            }
        }
        if !self.transitions.contains(&transition) {
            self.transitions.push(transition);
        }
        Ok(())
    }

    /// Returns true if the transition was present.
    pub fn remove_transition(&mut self, transition: &Transition) -> bool {
        let before = self.transitions.len();
        self.transitions.retain(|t| t != transition);
        before != self.transitions.len()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transitions_from(&self, id: StateId) -> Vec<&Transition> {
        self.transitions.iter().filter(|t| t.from == id).collect()
    }

    pub fn transitions_to(&self, id: StateId) -> Vec<&Transition> {
        self.transitions.iter().filter(|t| t.to == id).collect()
    }

    /// Check the structural invariants: an initial state exists, and every
    /// transition endpoint, the initial state and every final state belong
    /// to this automaton.
    pub fn validate(&self) -> Result<()> {
        let initial = self.require_initial()?;
        self.require_state(initial)?;
        for final_state in self.finals.iter() {
            self.require_state(final_state)?;
        }
        for transition in &self.transitions {
            for endpoint in [transition.from, transition.to] {
                if !self.contains_state(endpoint) {
                    return Err(InvalidAutomaton::ForeignState { state: endpoint }.into());
                }
            }
        }
        Ok(())
    }

    /// Fail with `NotFsa` unless this is a finite state automaton.
    pub fn require_fsa(&self) -> Result<()> {
        if self.kind != AutomatonKind::Fsa {
            return Err(InvalidAutomaton::NotFsa { found: self.kind }.into());
        }
        Ok(())
    }

    fn require_state(&self, id: StateId) -> Result<()> {
        if self.contains_state(id) {
            Ok(())
        } else {
            Err(InvalidAutomaton::UnknownState { state: id }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_build_fsa() {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.create_state(Point::new(10.0, 20.0));
        let q1 = fsa.add_state();
        fsa.set_initial(q0).unwrap();
        fsa.add_final(q1).unwrap();
        fsa.add_transition(Transition::fsa(q0, q1, "a")).unwrap();
        fsa.add_transition(Transition::fsa(q0, q1, "a")).unwrap();

        assert_eq!(fsa.num_states(), 2);
        assert_eq!(fsa.transitions().len(), 1);
        assert_eq!(fsa.transitions_from(q0).len(), 1);
        assert_eq!(fsa.transitions_to(q1).len(), 1);
        assert!(fsa.is_final(q1));
        assert!(!fsa.is_final(q0));
        assert_eq!(fsa.state(q0).unwrap().point(), Point::new(10.0, 20.0));
        assert!(fsa.validate().is_ok());
    }

    #[test]
    fn test_remove_state_drops_transitions() {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        let q1 = fsa.add_state();
        let q2 = fsa.add_state();
        fsa.set_initial(q0).unwrap();
        fsa.add_final(q1).unwrap();
        fsa.add_transition(Transition::fsa(q0, q1, "a")).unwrap();
        fsa.add_transition(Transition::fsa(q1, q2, "b")).unwrap();
        fsa.add_transition(Transition::fsa(q0, q2, "c")).unwrap();

        fsa.remove_state(q1).unwrap();
        assert_eq!(fsa.transitions().len(), 1);
        assert!(!fsa.is_final(q1));
        assert_eq!(fsa.state_ids().collect::<Vec<_>>(), vec![q0, q2]);

        fsa.remove_state(q0).unwrap();
        assert_eq!(fsa.initial(), None);
        assert!(fsa.transitions().is_empty());
    }

    #[test]
    fn test_rejects_foreign_state() {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        let err = fsa.add_transition(Transition::fsa(q0, 7, "a")).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidAutomaton(InvalidAutomaton::ForeignState { state: 7 })
        );
    }

    #[test]
    fn test_rejects_kind_mismatch() {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        let err = fsa
            .add_transition(Transition::pda(q0, q0, "a", "", "A"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidAutomaton(InvalidAutomaton::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_initial() {
        let mut pda = Automaton::pda();
        pda.add_state();
        assert_eq!(
            pda.validate().unwrap_err(),
            Error::InvalidAutomaton(InvalidAutomaton::MissingInitialState)
        );
    }

    #[test]
    fn test_initial_stack_is_pda_only() {
        let mut pda = Automaton::pda();
        assert_eq!(pda.initial_stack(), "");
        pda.set_initial_stack("Z").unwrap();
        assert_eq!(pda.initial_stack(), "Z");

        let mut fsa = Automaton::fsa();
        assert!(matches!(
            fsa.set_initial_stack("Z"),
            Err(Error::InvalidAutomaton(InvalidAutomaton::Unsupported { .. }))
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_labeled_state("start");
        fsa.set_initial(q0).unwrap();
        let snapshot = fsa.clone();
        fsa.add_final(q0).unwrap();
        fsa.set_label(q0, None).unwrap();

        assert!(!snapshot.is_final(q0));
        assert_eq!(snapshot.state_name(q0), "start");
        assert_eq!(fsa.state_name(q0), "q0");
    }
}
