//! Finite automaton conversions for the automaton graph model.
//!
//! This module provides epsilon-NFA and DFA implementations with:
//! - Epsilon closure computation
//! - Subset construction (NFA to DFA conversion)
//! - Moore-style partition refinement minimization
//! - Language equivalence of finite state automata
//! - Regular expressions, to and from automata
//!
//! The entry points take an [`Automaton`] by reference, copy what they need
//! into the index-based structures below and hand back new automata; the
//! caller's automaton is never touched.

mod dfa;
mod epsilon_nfa;
mod equivalence;
mod regex;
mod subset_construction;

pub use dfa::{DFA, MinimizedDFA};
pub use epsilon_nfa::{EpsilonNFA, ImportedNFA};
pub use equivalence::minimal_dfas_equivalent;
pub use regex::{Regex, fsa_to_regex, regex_to_fsa};
pub use subset_construction::subset_construction;

use crate::automaton::{Automaton, StateId};
use crate::error::Result;
use log::debug;

/// Convert a (possibly nondeterministic) FSA into an equivalent DFA.
///
/// Each state of the result is labeled with the names of the NFA states in
/// its subset. Multi-character labels are split into single symbols first.
pub fn convert_nfa_to_dfa(nfa: &Automaton) -> Result<Automaton> {
    let snapshot = nfa.clone();
    let imported = EpsilonNFA::from_automaton(&snapshot)?;
    let mut work = imported.nfa.clone();
    work.compute_epsilon_closures();
    let dfa = subset_construction(&work);
    name_subsets(&dfa, &imported, &snapshot)
}

fn name_subsets(dfa: &DFA, imported: &ImportedNFA, source: &Automaton) -> Result<Automaton> {
    let mapping = dfa.state_mapping();
    dfa.to_automaton(|state| {
        let members = mapping?.get(&state)?;
        let names: Vec<String> = imported
            .origins(members.iter().copied())
            .into_iter()
            .map(|id| source.state_name(id))
            .collect();
        (!names.is_empty()).then(|| names.join(","))
    })
}

/// Result of [`minimize`].
#[derive(Debug, Clone)]
pub struct Minimization {
    /// The minimum-state DFA.
    pub automaton: Automaton,
    /// The deterministic automaton that was refined: a copy of the input if
    /// it was already deterministic, otherwise its subset construction.
    pub refined: Automaton,
    /// For each state of `automaton` (in state order), the states of
    /// `refined` merged into it.
    pub blocks: Vec<Vec<StateId>>,
    /// The partition of `refined`'s reachable states after each refinement
    /// round.
    pub rounds: Vec<Vec<Vec<StateId>>>,
}

/// Determinize `fsa` if needed. Returns the DFA and, for each DFA index, the
/// state id it corresponds to in the returned automaton.
fn determinize(fsa: &Automaton) -> Result<(DFA, Automaton, Vec<StateId>)> {
    if let Some((dfa, ids)) = DFA::from_deterministic(fsa)? {
        return Ok((dfa, fsa.clone(), ids));
    }
    let imported = EpsilonNFA::from_automaton(fsa)?;
    let mut work = imported.nfa.clone();
    work.compute_epsilon_closures();
    let dfa = subset_construction(&work);
    let automaton = name_subsets(&dfa, &imported, fsa)?;
    let ids = automaton.state_ids().collect();
    Ok((dfa, automaton, ids))
}

/// Produce the minimum-state DFA for an FSA, with the partition history for
/// display.
///
/// A nondeterministic input is run through subset construction first.
pub fn minimize(fsa: &Automaton) -> Result<Minimization> {
    let snapshot = fsa.clone();
    let (dfa, refined, ids) = determinize(&snapshot)?;
    let minimized = dfa.minimize();

    let to_ids = |block: &Vec<StateId>| -> Vec<StateId> {
        block.iter().map(|&index| ids[index as usize]).collect()
    };
    let blocks: Vec<Vec<StateId>> = minimized.blocks.iter().map(to_ids).collect();
    let rounds: Vec<Vec<Vec<StateId>>> = minimized
        .rounds
        .iter()
        .map(|partition| partition.iter().map(to_ids).collect::<Vec<_>>())
        .collect();

    let automaton = minimized.dfa.to_automaton(|state| {
        let names: Vec<String> = blocks
            .get(state as usize)?
            .iter()
            .map(|&id| refined.state_name(id))
            .collect();
        (!names.is_empty()).then(|| names.join(","))
    })?;

    debug!(
        "minimized {} states to {}",
        refined.num_states(),
        automaton.num_states()
    );
    Ok(Minimization {
        automaton,
        refined,
        blocks,
        rounds,
    })
}

fn minimal_dfa(fsa: &Automaton) -> Result<DFA> {
    let snapshot = fsa.clone();
    let (dfa, _, _) = determinize(&snapshot)?;
    Ok(dfa.minimize().dfa)
}

/// Whether two FSAs accept the same language.
pub fn fsa_equal(a: &Automaton, b: &Automaton) -> Result<bool> {
    let min_a = minimal_dfa(a)?;
    let min_b = minimal_dfa(b)?;
    Ok(minimal_dfas_equivalent(&min_a, &min_b))
}
