//! Right-linear grammar to finite state automaton.

use super::{Grammar, GrammarConverter, Production};
use crate::automaton::{Automaton, StateId, Transition};
use crate::error::{Error, InvalidAutomaton, Result};
use indexmap::IndexMap;
use log::debug;

/// One state per variable, start variable first, plus a single final state.
/// `A → xB` becomes `A --x--> B` and `A → x` becomes `A --x--> final`.
#[derive(Debug, Clone)]
pub struct RightLinearConverter {
    grammar: Grammar,
    states: IndexMap<char, StateId>,
    final_state: StateId,
}

impl RightLinearConverter {
    /// Fails with `NotRightLinear` naming the first offending production.
    pub fn new(grammar: &Grammar) -> Result<Self> {
        if let Some(bad) = grammar.productions().iter().find(|p| !p.is_right_linear()) {
            return Err(InvalidAutomaton::NotRightLinear {
                production: bad.to_string(),
            }
            .into());
        }
        let mut states = IndexMap::new();
        states.insert(grammar.start(), 0);
        for variable in grammar.variables() {
            let next = states.len() as StateId;
            states.entry(variable).or_insert(next);
        }
        let final_state = states.len() as StateId;
        Ok(Self {
            grammar: grammar.clone(),
            states,
            final_state,
        })
    }

    /// State standing for `variable`.
    pub fn state_for(&self, variable: char) -> Option<StateId> {
        self.states.get(&variable).copied()
    }

    pub fn final_state(&self) -> StateId {
        self.final_state
    }
}

impl GrammarConverter for RightLinearConverter {
    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn create_states(&self) -> Result<Automaton> {
        let mut fsa = Automaton::fsa();
        for &variable in self.states.keys() {
            fsa.add_labeled_state(variable.to_string());
        }
        let final_state = fsa.add_state();
        fsa.set_initial(0)?;
        fsa.add_final(final_state)?;
        Ok(fsa)
    }

    fn transition_for(&self, production: &Production) -> Result<Transition> {
        let (read, next) = production
            .right_linear_parts()
            .ok_or_else(|| InvalidAutomaton::NotRightLinear {
                production: production.to_string(),
            })?;
        let unknown = |variable: char| Error::MalformedProduction {
            production: production.to_string(),
            reason: format!("variable {variable} is not part of the grammar"),
        };
        let from = self
            .state_for(production.lhs())
            .ok_or_else(|| unknown(production.lhs()))?;
        let to = match next {
            Some(variable) => self.state_for(variable).ok_or_else(|| unknown(variable))?,
            None => self.final_state,
        };
        Ok(Transition::fsa(from, to, read))
    }
}

/// Build an FSA accepting exactly the language of a right-linear grammar.
pub fn grammar_to_fsa(grammar: &Grammar) -> Result<Automaton> {
    let fsa = RightLinearConverter::new(grammar)?.convert()?;
    debug!(
        "right-linear grammar with {} productions -> FSA with {} states",
        grammar.productions().len(),
        fsa.num_states()
    );
    Ok(fsa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::sim::Simulator;

    fn accepts(fsa: &Automaton, input: &str) -> bool {
        Simulator::new(fsa, SearchConfig::default())
            .unwrap()
            .run(input)
            .unwrap()
    }

    #[test]
    fn test_a_star_b() {
        let grammar = Grammar::parse("S -> aS | b").unwrap();
        let fsa = grammar_to_fsa(&grammar).unwrap();
        assert_eq!(fsa.num_states(), 2);
        assert!(accepts(&fsa, "aaab"));
        assert!(!accepts(&fsa, "aaa"));
        assert!(accepts(&fsa, "b"));
        assert!(!accepts(&fsa, "ba"));
    }

    #[test]
    fn test_states_and_incremental_transitions() {
        let grammar = Grammar::parse("S -> abA | λ\nA -> cS").unwrap();
        let converter = RightLinearConverter::new(&grammar).unwrap();
        let scaffold = converter.create_states().unwrap();
        assert_eq!(scaffold.num_states(), 3);
        assert_eq!(scaffold.state_name(0), "S");
        assert_eq!(scaffold.state_name(1), "A");
        assert!(scaffold.is_final(2));
        assert!(scaffold.transitions().is_empty());

        let first = converter.transition_for(&grammar.productions()[0]).unwrap();
        assert_eq!(first, Transition::fsa(0, 1, "ab"));
        let epsilon = converter.transition_for(&grammar.productions()[1]).unwrap();
        assert_eq!(epsilon, Transition::fsa(0, 2, ""));

        let fsa = converter.convert().unwrap();
        assert!(accepts(&fsa, ""));
        assert!(accepts(&fsa, "abcabc"));
        assert!(!accepts(&fsa, "abca"));
    }

    #[test]
    fn test_rejects_non_right_linear() {
        let grammar = Grammar::parse("S -> aSb | λ").unwrap();
        assert_eq!(
            grammar_to_fsa(&grammar).unwrap_err(),
            Error::InvalidAutomaton(InvalidAutomaton::NotRightLinear {
                production: "S → aSb".to_string()
            })
        );
    }

    #[test]
    fn test_foreign_production() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let converter = RightLinearConverter::new(&grammar).unwrap();
        let stray = Production::new('Q', "a").unwrap();
        assert!(matches!(
            converter.transition_for(&stray),
            Err(Error::MalformedProduction { .. })
        ));
    }
}
