//! Structural comparison of minimized DFAs.

use crate::automaton::StateId;
use crate::formlang::dfa::DFA;
use log::trace;
use std::collections::{HashMap, VecDeque};

/// Whether two minimal DFAs accept the same language.
///
/// Dead states (no final state reachable) are ignored on both sides, which
/// makes the result independent of trap states and of alphabet symbols that
/// only ever lead to rejection. The remaining states are paired by a
/// simultaneous breadth-first walk from the start states; the walk fails if a
/// symbol leads one side somewhere the other cannot follow, if a state would
/// get two partners, or if a pair disagrees on finality.
pub fn minimal_dfas_equivalent(a: &DFA, b: &DFA) -> bool {
    let live_a = a.live_states();
    let live_b = b.live_states();
    let start_a = a.start_state().filter(|&s| live_a.contains(s));
    let start_b = b.start_state().filter(|&s| live_b.contains(s));

    let (start_a, start_b) = match (start_a, start_b) {
        (Some(sa), Some(sb)) => (sa, sb),
        // both languages are empty
        (None, None) => return true,
        _ => return false,
    };

    let mut a_to_b: HashMap<StateId, StateId> = HashMap::new();
    let mut b_to_a: HashMap<StateId, StateId> = HashMap::new();
    let mut queue = VecDeque::new();
    a_to_b.insert(start_a, start_b);
    b_to_a.insert(start_b, start_a);
    queue.push_back((start_a, start_b));

    let symbols: Vec<_> = a.alphabet().union(b.alphabet()).copied().collect();

    while let Some((sa, sb)) = queue.pop_front() {
        if a.is_final(sa) != b.is_final(sb) {
            trace!("finality differs for pair ({sa}, {sb})");
            return false;
        }

        for &symbol in &symbols {
            let next_a = a.transition(sa, symbol).filter(|&s| live_a.contains(s));
            let next_b = b.transition(sb, symbol).filter(|&s| live_b.contains(s));
            match (next_a, next_b) {
                (None, None) => {}
                (Some(na), Some(nb)) => match (a_to_b.get(&na), b_to_a.get(&nb)) {
                    (None, None) => {
                        a_to_b.insert(na, nb);
                        b_to_a.insert(nb, na);
                        queue.push_back((na, nb));
                    }
                    (Some(&pa), Some(&pb)) if pa == nb && pb == na => {}
                    _ => {
                        trace!("pairing conflict at ({na}, {nb})");
                        return false;
                    }
                },
                _ => {
                    trace!("symbol {symbol} only moves one side of pair ({sa}, {sb})");
                    return false;
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::symbol::symbol_of;

    fn dfa(states: u32, finals: &[u32], moves: &[(u32, char, u32)]) -> DFA {
        let mut dfa = DFA::new();
        for _ in 0..states {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        for &f in finals {
            dfa.add_final_state(f);
        }
        for &(src, c, dst) in moves {
            dfa.add_transition(src, symbol_of(c), dst);
        }
        dfa
    }

    #[test]
    fn test_isomorphic_with_different_numbering() {
        let a = dfa(2, &[1], &[(0, 'a', 1), (1, 'a', 0)]);
        let b = dfa(2, &[0], &[(1, 'a', 0), (0, 'a', 1)]);
        // same shape, but b accepts the empty string
        assert!(!minimal_dfas_equivalent(&a, &b));

        let c = dfa(2, &[1], &[(0, 'a', 1), (1, 'a', 0)]);
        assert!(minimal_dfas_equivalent(&a, &c));
    }

    #[test]
    fn test_trap_state_is_ignored() {
        let partial = dfa(2, &[1], &[(0, 'a', 1)]);
        let complete = dfa(3, &[1], &[(0, 'a', 1), (1, 'a', 2), (2, 'a', 2)]);
        assert!(minimal_dfas_equivalent(&partial, &complete));
    }

    #[test]
    fn test_extra_symbol_into_dead_state() {
        let a = dfa(2, &[1], &[(0, 'a', 1)]);
        let b = dfa(3, &[1], &[(0, 'a', 1), (0, 'b', 2)]);
        assert!(minimal_dfas_equivalent(&a, &b));

        let c = dfa(2, &[1], &[(0, 'a', 1), (0, 'b', 1)]);
        assert!(!minimal_dfas_equivalent(&a, &c));
    }

    #[test]
    fn test_empty_languages() {
        let a = dfa(1, &[], &[]);
        let b = dfa(2, &[], &[(0, 'z', 1)]);
        assert!(minimal_dfas_equivalent(&a, &b));

        let c = dfa(1, &[0], &[]);
        assert!(!minimal_dfas_equivalent(&a, &c));
    }
}
