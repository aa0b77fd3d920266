//! Finite state automaton to right-linear grammar.

use super::{Grammar, Production, is_variable};
use crate::automaton::symbol::END_MARKER;
use crate::automaton::{Automaton, Label, StateId};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Read off a right-linear grammar: the initial state is `S`, the other
/// states take the remaining capitals in state order, `p --x--> q` yields
/// `P → xQ` and every final state `F` yields `F → λ`.
pub fn fsa_to_grammar(fsa: &Automaton) -> Result<Grammar> {
    fsa.require_fsa()?;
    let initial = fsa.require_initial()?;

    let mut letters = ('A'..='Z').filter(|&c| c != 'S');
    let mut names: HashMap<StateId, char> = HashMap::from([(initial, 'S')]);
    for state in fsa.state_ids().filter(|&s| s != initial) {
        names.insert(state, letters.next().ok_or(Error::NoFreeVariable)?);
    }

    let mut grammar = Grammar::new('S')?;
    for transition in fsa.transitions() {
        let Label::Fsa { read } = &transition.label else {
            continue;
        };
        if read.chars().any(|c| is_variable(c) || c == END_MARKER) {
            return Err(Error::MalformedProduction {
                production: transition.to_string(),
                reason: "label uses a symbol reserved for grammars".to_string(),
            });
        }
        let (Some(&from), Some(&to)) = (names.get(&transition.from), names.get(&transition.to))
        else {
            continue;
        };
        grammar.add_production(Production::new(from, format!("{read}{to}"))?);
    }
    for state in fsa.state_ids().filter(|&s| fsa.is_final(s)) {
        if let Some(&name) = names.get(&state) {
            grammar.add_production(Production::new(name, "")?);
        }
    }
    Ok(grammar)
}
