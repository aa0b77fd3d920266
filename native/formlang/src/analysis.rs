//! Structural reports over automata: where they branch, where they read
//! nothing, and what they read.

use crate::automaton::symbol::BLANK;
use crate::automaton::{Automaton, Label, StateId, Transition};
use crate::error::Result;
use crate::formlang::fsa_equal;
use crate::grammar::Grammar;
use std::collections::BTreeSet;

fn prefix_related(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Whether two moves out of the same state could both fire on some
/// configuration.
fn overlaps(a: &Label, b: &Label) -> bool {
    match (a, b) {
        (Label::Fsa { read: ra }, Label::Fsa { read: rb }) => prefix_related(ra, rb),
        (
            Label::Pda {
                read: ra, pop: pa, ..
            },
            Label::Pda {
                read: rb, pop: pb, ..
            },
        ) => prefix_related(ra, rb) && prefix_related(pa, pb),
        (Label::Turing { read: ra, .. }, Label::Turing { read: rb, .. }) => ra == rb,
        _ => false,
    }
}

/// States with at least two outgoing transitions that can apply at once,
/// in state order.
///
/// For a finite state automaton two labels clash when one is a prefix of
/// the other, so a λ move clashes with everything. Pushdown moves must
/// also have prefix-related pop strings. Turing moves clash on equal read
/// symbols.
pub fn nondeterministic_states(automaton: &Automaton) -> Vec<StateId> {
    automaton
        .state_ids()
        .filter(|&state| {
            let out = automaton.transitions_from(state);
            out.iter().enumerate().any(|(i, a)| {
                out[i + 1..]
                    .iter()
                    .any(|b| overlaps(&a.label, &b.label))
            })
        })
        .collect()
}

/// Transitions that consume no input.
pub fn lambda_transitions(automaton: &Automaton) -> Vec<&Transition> {
    automaton
        .transitions()
        .iter()
        .filter(|t| t.is_lambda())
        .collect()
}

pub fn is_deterministic(automaton: &Automaton) -> bool {
    nondeterministic_states(automaton).is_empty()
}

/// Input symbols read anywhere in the automaton. The blank is not part of a
/// Turing machine's input alphabet.
pub fn alphabet(automaton: &Automaton) -> BTreeSet<char> {
    let mut symbols = BTreeSet::new();
    for transition in automaton.transitions() {
        match &transition.label {
            Label::Fsa { read } | Label::Pda { read, .. } => symbols.extend(read.chars()),
            Label::Turing { read, .. } if *read != BLANK => {
                symbols.insert(*read);
            }
            Label::Turing { .. } => {}
        }
    }
    symbols
}

pub fn grammar_alphabet(grammar: &Grammar) -> BTreeSet<char> {
    grammar.terminals()
}

/// Whether every automaton accepts the same language as the first one.
/// An empty or single-element slice is trivially equivalent.
pub fn all_equivalent(automata: &[Automaton]) -> Result<bool> {
    let Some((first, rest)) = automata.split_first() else {
        return Ok(true);
    };
    for other in rest {
        if !fsa_equal(first, other)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Direction;

    fn branching_fsa() -> Automaton {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        let q1 = fsa.add_state();
        let q2 = fsa.add_state();
        fsa.set_initial(q0).unwrap();
        fsa.add_final(q2).unwrap();
        fsa.add_transition(Transition::fsa(q0, q1, "ab")).unwrap();
        fsa.add_transition(Transition::fsa(q0, q2, "a")).unwrap();
        fsa.add_transition(Transition::fsa(q1, q2, "b")).unwrap();
        fsa.add_transition(Transition::fsa(q1, q2, "c")).unwrap();
        fsa.add_transition(Transition::fsa(q2, q0, "")).unwrap();
        fsa
    }

    #[test]
    fn test_prefix_labels_are_nondeterministic() {
        let fsa = branching_fsa();
        assert_eq!(nondeterministic_states(&fsa), vec![0]);
        assert!(!is_deterministic(&fsa));

        let lambdas = lambda_transitions(&fsa);
        assert_eq!(lambdas.len(), 1);
        assert_eq!((lambdas[0].from, lambdas[0].to), (2, 0));
        assert_eq!(alphabet(&fsa), BTreeSet::from(['a', 'b', 'c']));
    }

    #[test]
    fn test_pda_needs_both_read_and_pop_overlap() {
        let mut pda = Automaton::pda();
        let q0 = pda.add_state();
        pda.set_initial(q0).unwrap();
        pda.add_transition(Transition::pda(q0, q0, "a", "X", "")).unwrap();
        pda.add_transition(Transition::pda(q0, q0, "a", "Y", "")).unwrap();
        assert!(is_deterministic(&pda));

        pda.add_transition(Transition::pda(q0, q0, "", "XZ", "")).unwrap();
        assert_eq!(nondeterministic_states(&pda), vec![q0]);
    }

    #[test]
    fn test_turing_alphabet_skips_blank() {
        let mut tm = Automaton::turing();
        let q0 = tm.add_state();
        tm.set_initial(q0).unwrap();
        tm.add_transition(Transition::turing(q0, q0, 'a', 'x', Direction::Right))
            .unwrap();
        tm.add_transition(Transition::turing(q0, q0, BLANK, 'y', Direction::Left))
            .unwrap();
        assert_eq!(alphabet(&tm), BTreeSet::from(['a']));
        assert!(is_deterministic(&tm));
        assert!(lambda_transitions(&tm).is_empty());
    }

    #[test]
    fn test_all_equivalent() {
        let fsa = branching_fsa();
        let dfa = crate::formlang::convert_nfa_to_dfa(&fsa).unwrap();
        assert!(all_equivalent(&[]).unwrap());
        assert!(all_equivalent(&[fsa.clone(), dfa.clone(), fsa.clone()]).unwrap());

        let mut other = fsa.clone();
        other.add_transition(Transition::fsa(1, 2, "d")).unwrap();
        assert!(!all_equivalent(&[fsa, dfa, other]).unwrap());
    }

    #[test]
    fn test_grammar_alphabet() {
        let grammar = Grammar::parse("S -> aSb | c").unwrap();
        assert_eq!(grammar_alphabet(&grammar), BTreeSet::from(['a', 'b', 'c']));
    }
}
