//! Subset construction algorithm for converting ε-NFA to DFA.

use crate::automaton::StateId;
use crate::automaton::StateSet;
use crate::formlang::dfa::DFA;
use crate::formlang::epsilon_nfa::EpsilonNFA;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::VecDeque;

/// Convert an epsilon-NFA to a DFA using the powerset construction algorithm.
///
/// DFA states are identified by the sorted members of their NFA subset, so
/// the same subset reached along different paths is one DFA state. States
/// are numbered in breadth-first discovery order with symbols taken in
/// ascending order, which makes the result deterministic. The empty subset
/// is never materialized, so the DFA may be partial.
pub fn subset_construction(nfa: &EpsilonNFA) -> DFA {
    let mut state_mapping: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut dfa = DFA::new();
    let mut worklist: VecDeque<StateSet> = VecDeque::new();

    // Initial DFA state is the epsilon closure of NFA start states
    let initial_set = nfa.epsilon_closure(nfa.start_states());
    if initial_set.is_empty() {
        return dfa;
    }

    let initial_dfa_state = dfa.add_state();
    state_mapping.insert(initial_set.to_vec(), initial_dfa_state);
    dfa.set_start_state(initial_dfa_state);
    if initial_set.intersects(nfa.final_states()) {
        dfa.add_final_state(initial_dfa_state);
    }
    worklist.push_back(initial_set);

    while let Some(current_nfa_set) = worklist.pop_front() {
        let current_dfa_state = state_mapping[&current_nfa_set.to_vec()];

        for &symbol in nfa.alphabet() {
            let next_nfa_set = nfa.move_on_symbol(&current_nfa_set, symbol);
            if next_nfa_set.is_empty() {
                continue;
            }

            let next_vec = next_nfa_set.to_vec();
            let next_dfa_state = match state_mapping.get(&next_vec) {
                Some(&existing) => existing,
                None => {
                    let new_state = dfa.add_state();
                    trace!("subset {next_vec:?} becomes DFA state {new_state}");
                    state_mapping.insert(next_vec, new_state);
                    if next_nfa_set.intersects(nfa.final_states()) {
                        dfa.add_final_state(new_state);
                    }
                    worklist.push_back(next_nfa_set);
                    new_state
                }
            };

            dfa.add_transition(current_dfa_state, symbol, next_dfa_state);
        }
    }

    debug!(
        "subset construction: {} NFA states -> {} DFA states",
        nfa.num_states(),
        dfa.num_states()
    );

    // Store the NFA-to-DFA state mapping in the DFA for later use
    dfa.set_state_mapping(
        state_mapping
            .into_iter()
            .map(|(nfa_states, dfa_state)| (dfa_state, nfa_states))
            .collect(),
    );

    dfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formlang::dfa::tests::accepts;
    use crate::automaton::symbol::symbol_of;

    #[test]
    fn test_subset_construction_basic() {
        // 0 -a-> 1, 0 -a-> 2, 1 -b-> 3(final), 2 -b-> 3(final)
        let mut nfa = EpsilonNFA::new();
        nfa.add_transition(0, symbol_of('a'), 1);
        nfa.add_transition(0, symbol_of('a'), 2);
        nfa.add_transition(1, symbol_of('b'), 3);
        nfa.add_transition(2, symbol_of('b'), 3);
        nfa.add_start_state(0);
        nfa.add_final_state(3);

        let dfa = subset_construction(&nfa);

        assert_eq!(dfa.num_states(), 3);
        assert_eq!(dfa.start_state(), Some(0));
        assert!(accepts(&dfa, "ab"));
        assert!(!accepts(&dfa, "a"));
        assert_eq!(dfa.state_mapping().unwrap()[&1], vec![1, 2]);
    }

    #[test]
    fn test_subset_construction_with_epsilon() {
        // 0 -ε-> 1 -a-> 2(final)
        let mut nfa = EpsilonNFA::new();
        nfa.add_epsilon_transition(0, 1);
        nfa.add_transition(1, symbol_of('a'), 2);
        nfa.add_start_state(0);
        nfa.add_final_state(2);

        let dfa = subset_construction(&nfa);

        assert!(accepts(&dfa, "a"));
        assert!(!accepts(&dfa, ""));
        assert_eq!(dfa.state_mapping().unwrap()[&0], vec![0, 1]);
    }

    #[test]
    fn test_same_subset_reached_twice_is_one_state() {
        // 0 -a-> {1, 2}, 0 -b-> {2, 1} by a different route
        let mut nfa = EpsilonNFA::new();
        nfa.add_transition(0, symbol_of('a'), 1);
        nfa.add_transition(0, symbol_of('a'), 2);
        nfa.add_transition(0, symbol_of('b'), 2);
        nfa.add_epsilon_transition(2, 1);
        nfa.add_start_state(0);
        nfa.add_final_state(1);

        let dfa = subset_construction(&nfa);
        let a = dfa.transition(0, symbol_of('a'));
        let b = dfa.transition(0, symbol_of('b'));
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(dfa.num_states(), 2);
    }

    #[test]
    fn test_empty_nfa() {
        let nfa = EpsilonNFA::new();
        let dfa = subset_construction(&nfa);
        assert!(dfa.start_state().is_none());
    }
}
