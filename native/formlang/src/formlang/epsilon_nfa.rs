//! Index-based ε-NFA used by the finite automaton converters.

use crate::automaton::symbol::{EPSILON, SymbolId, is_epsilon, symbol_of};
use crate::automaton::{Automaton, Label, StateId, StateSet};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Outgoing moves of one NFA state.
#[derive(Debug, Clone, Default)]
struct Moves {
    on_symbol: BTreeMap<SymbolId, StateSet>,
    on_epsilon: StateSet,
}

/// An ε-NFA over dense state indices `0..num_states`, with every move
/// reading one symbol or none.
#[derive(Debug, Clone, Default)]
pub struct EpsilonNFA {
    moves: Vec<Moves>,
    start: StateSet,
    accepting: StateSet,
    /// Symbols read by some move; never contains `EPSILON`.
    alphabet: BTreeSet<SymbolId>,
    /// Per-state ε-closures, filled by `compute_epsilon_closures` and dropped
    /// on any edit.
    closures: Option<Vec<StateSet>>,
}

/// An ε-NFA built from an [`Automaton`], remembering where each index came
/// from. Indices created to split multi-character labels have no origin.
#[derive(Debug, Clone)]
pub struct ImportedNFA {
    pub nfa: EpsilonNFA,
    pub origin: Vec<Option<StateId>>,
}

impl ImportedNFA {
    /// The automaton states behind a set of NFA indices.
    pub fn origins(&self, states: impl IntoIterator<Item = StateId>) -> Vec<StateId> {
        let mut ids: Vec<StateId> = states
            .into_iter()
            .filter_map(|s| self.origin.get(s as usize).copied().flatten())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl EpsilonNFA {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a finite state automaton.
    ///
    /// A label of `n > 1` characters becomes a chain of `n` single-symbol
    /// moves through fresh intermediate states.
    pub fn from_automaton(automaton: &Automaton) -> Result<ImportedNFA> {
        automaton.require_fsa()?;
        let initial = automaton.require_initial()?;

        let mut nfa = EpsilonNFA::new();
        let mut origin = Vec::with_capacity(automaton.num_states());
        let index_of: HashMap<StateId, StateId> = automaton
            .state_ids()
            .map(|id| {
                origin.push(Some(id));
                (id, nfa.add_state())
            })
            .collect();

        nfa.add_start_state(index_of[&initial]);
        for id in automaton.finals().iter() {
            if let Some(&index) = index_of.get(&id) {
                nfa.add_final_state(index);
            }
        }

        for transition in automaton.transitions() {
            let Label::Fsa { read } = &transition.label else {
                continue;
            };
            let from = index_of.get(&transition.from);
            let to = index_of.get(&transition.to);
            let (Some(&from), Some(&to)) = (from, to) else {
                continue;
            };
            if read.is_empty() {
                nfa.add_epsilon_transition(from, to);
                continue;
            }

            let mut symbols = read.chars().map(symbol_of).peekable();
            let mut current = from;
            while let Some(symbol) = symbols.next() {
                let next = if symbols.peek().is_some() {
                    origin.push(None);
                    nfa.add_state()
                } else {
                    to
                };
                nfa.add_transition(current, symbol, next);
                current = next;
            }
        }

        Ok(ImportedNFA { nfa, origin })
    }

    /// Append a fresh state and return its index.
    pub fn add_state(&mut self) -> StateId {
        self.moves.push(Moves::default());
        self.closures = None;
        (self.moves.len() - 1) as StateId
    }

    fn grow_to(&mut self, state: StateId) {
        while self.moves.len() <= state as usize {
            self.add_state();
        }
    }

    /// Add a move, creating any state index that does not exist yet.
    pub fn add_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.grow_to(source.max(destination));
        let moves = &mut self.moves[source as usize];
        if is_epsilon(symbol) {
            moves.on_epsilon.insert(destination);
        } else {
            moves.on_symbol.entry(symbol).or_default().insert(destination);
            self.alphabet.insert(symbol);
        }
        self.closures = None;
    }

    pub fn add_epsilon_transition(&mut self, source: StateId, destination: StateId) {
        self.add_transition(source, EPSILON, destination);
    }

    pub fn add_start_state(&mut self, state: StateId) {
        self.grow_to(state);
        self.start.insert(state);
    }

    pub fn add_final_state(&mut self, state: StateId) {
        self.grow_to(state);
        self.accepting.insert(state);
    }

    pub fn num_states(&self) -> StateId {
        self.moves.len() as StateId
    }

    pub fn start_states(&self) -> &StateSet {
        &self.start
    }

    pub fn final_states(&self) -> &StateSet {
        &self.accepting
    }

    pub fn alphabet(&self) -> &BTreeSet<SymbolId> {
        &self.alphabet
    }

    /// Fill the per-state closure cache used by [`EpsilonNFA::epsilon_closure`].
    pub fn compute_epsilon_closures(&mut self) {
        if self.closures.is_none() {
            let closures = (0..self.num_states())
                .map(|state| self.walk_epsilon(std::iter::once(state)))
                .collect();
            self.closures = Some(closures);
        }
    }

    fn walk_epsilon(&self, seeds: impl Iterator<Item = StateId>) -> StateSet {
        let mut closure = StateSet::with_capacity(self.moves.len());
        let mut pending: Vec<StateId> = seeds.collect();
        while let Some(state) = pending.pop() {
            if !closure.insert(state) {
                continue;
            }
            if let Some(moves) = self.moves.get(state as usize) {
                pending.extend(moves.on_epsilon.iter());
            }
        }
        closure
    }

    /// States reachable from `states` through ε moves alone, `states`
    /// included.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let Some(cached) = &self.closures else {
            return self.walk_epsilon(states.iter());
        };
        let mut closure = StateSet::with_capacity(self.moves.len());
        for state in states.iter() {
            if let Some(reach) = cached.get(state as usize) {
                closure.union_with(reach);
            }
        }
        closure
    }

    /// ε-closure of the states reached from `states` by one `symbol` move.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: SymbolId) -> StateSet {
        debug_assert!(!is_epsilon(symbol), "ε moves go through epsilon_closure");
        let mut reached = StateSet::with_capacity(self.moves.len());
        for state in states.iter() {
            if let Some(targets) = self
                .moves
                .get(state as usize)
                .and_then(|moves| moves.on_symbol.get(&symbol))
            {
                reached.union_with(targets);
            }
        }
        self.epsilon_closure(&reached)
    }
}
