//! Context-free grammar to pushdown automaton (top-down construction), and
//! the LL(1) predictive table for the same grammar.

use super::first_follow::FirstFollow;
use super::{Grammar, GrammarConverter, Production, is_variable};
use crate::automaton::symbol::END_MARKER;
use crate::automaton::{Automaton, StateId, Transition};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::collections::BTreeMap;

const START: StateId = 0;
const WORK: StateId = 1;
const ACCEPT: StateId = 2;

/// Builds the three-state PDA that simulates leftmost derivations. The stack
/// starts as `$`; the first move puts the start variable above it,
/// productions expand the variable on top, terminals are matched against the
/// input, and popping `$` reaches the final state. The stack is empty exactly
/// when the final state is entered, so every acceptance mode agrees.
#[derive(Debug, Clone)]
pub struct LlPdaConverter {
    grammar: Grammar,
}

impl LlPdaConverter {
    pub fn new(grammar: &Grammar) -> Self {
        Self {
            grammar: grammar.clone(),
        }
    }
}

impl GrammarConverter for LlPdaConverter {
    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn create_states(&self) -> Result<Automaton> {
        let mut pda = Automaton::pda();
        for _ in [START, WORK, ACCEPT] {
            pda.add_state();
        }
        pda.set_initial(START)?;
        pda.add_final(ACCEPT)?;
        let bottom = END_MARKER.to_string();
        pda.set_initial_stack(bottom.clone())?;

        let start = format!("{}{END_MARKER}", self.grammar.start());
        pda.add_transition(Transition::pda(START, WORK, "", bottom.clone(), start))?;
        for terminal in self.grammar.terminals() {
            let t = terminal.to_string();
            pda.add_transition(Transition::pda(WORK, WORK, t.clone(), t, ""))?;
        }
        pda.add_transition(Transition::pda(WORK, ACCEPT, "", bottom, ""))?;
        Ok(pda)
    }

    fn transition_for(&self, production: &Production) -> Result<Transition> {
        Ok(Transition::pda(
            WORK,
            WORK,
            "",
            production.lhs().to_string(),
            production.rhs(),
        ))
    }
}

/// Build a PDA for the language of any context-free grammar, under every
/// [`AcceptanceMode`](crate::config::AcceptanceMode).
pub fn grammar_to_pda(grammar: &Grammar) -> Result<Automaton> {
    let pda = LlPdaConverter::new(grammar).convert()?;
    debug!(
        "grammar with {} productions -> PDA with {} transitions",
        grammar.productions().len(),
        pda.transitions().len()
    );
    Ok(pda)
}

/// LL(1) parse table: rows are variables, columns terminals and `$`, cells
/// hold production indices. A cell with more than one entry is a conflict.
#[derive(Debug, Clone)]
pub struct LlTable {
    grammar: Grammar,
    cells: BTreeMap<(char, char), Vec<usize>>,
}

impl LlTable {
    /// Fill the table, keeping every conflicting entry.
    pub fn build(grammar: &Grammar) -> Self {
        let sets = FirstFollow::new(grammar);
        let mut cells: BTreeMap<(char, char), Vec<usize>> = BTreeMap::new();
        for (index, production) in grammar.productions().iter().enumerate() {
            let mut lookahead = sets.first_of(production.rhs());
            if sets.is_nullable(production.rhs()) {
                lookahead.extend(sets.follow(production.lhs()).iter().copied());
            }
            for symbol in lookahead {
                trace!("LL[{}, {symbol}] += {production}", production.lhs());
                let cell = cells.entry((production.lhs(), symbol)).or_default();
                if !cell.contains(&index) {
                    cell.push(index);
                }
            }
        }
        Self {
            grammar: grammar.clone(),
            cells,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Production indices in cell (`variable`, `lookahead`).
    pub fn entries(&self, variable: char, lookahead: char) -> &[usize] {
        self.cells
            .get(&(variable, lookahead))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The production to expand with, if the cell holds exactly one.
    pub fn get(&self, variable: char, lookahead: char) -> Option<&Production> {
        match self.entries(variable, lookahead) {
            [index] => self.grammar.productions().get(*index),
            _ => None,
        }
    }

    /// Cells holding more than one production, in row then column order.
    pub fn conflicts(&self) -> Vec<(char, char)> {
        self.cells
            .iter()
            .filter(|(_, entries)| entries.len() > 1)
            .map(|(&cell, _)| cell)
            .collect()
    }

    fn first_conflict(&self) -> Option<Error> {
        let (&(variable, symbol), entries) =
            self.cells.iter().find(|(_, entries)| entries.len() > 1)?;
        let productions = self.grammar.productions();
        Some(Error::GrammarConflict {
            row: variable.to_string(),
            symbol,
            existing: productions[entries[0]].to_string(),
            incoming: productions[entries[1]].to_string(),
        })
    }

    /// Predictive parse of `input`. A conflicting cell counts as no entry.
    pub fn accepts(&self, input: &str) -> bool {
        let mut stack = vec![END_MARKER, self.grammar.start()];
        let mut rest = input.chars().chain(std::iter::once(END_MARKER)).peekable();
        while let Some(top) = stack.pop() {
            let Some(&lookahead) = rest.peek() else {
                return false;
            };
            if is_variable(top) {
                let Some(production) = self.get(top, lookahead) else {
                    return false;
                };
                stack.extend(production.rhs().chars().rev());
            } else if top == lookahead {
                rest.next();
            } else {
                return false;
            }
        }
        rest.next().is_none()
    }
}

/// The LL(1) table, failing with `GrammarConflict` if any cell is claimed by
/// two productions.
pub fn ll_table(grammar: &Grammar) -> Result<LlTable> {
    let table = LlTable::build(grammar);
    match table.first_conflict() {
        Some(conflict) => Err(conflict),
        None => Ok(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AcceptanceMode, SearchConfig};
    use crate::sim::Simulator;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn run(pda: &Automaton, mode: AcceptanceMode, input: &str) -> bool {
        let config = SearchConfig::default().with_acceptance(mode);
        Simulator::new(pda, config).unwrap().run(input).unwrap()
    }

    #[test]
    fn test_pda_for_anbn() {
        init();
        let grammar = Grammar::parse("S -> aSb | λ").unwrap();
        let pda = grammar_to_pda(&grammar).unwrap();
        assert_eq!(pda.num_states(), 3);
        // start push, two terminals, end pop, two productions
        assert_eq!(pda.transitions().len(), 6);

        assert_eq!(pda.initial_stack(), "$");

        for mode in [
            AcceptanceMode::FinalState,
            AcceptanceMode::EmptyStack,
            AcceptanceMode::FinalStateAndEmptyStack,
        ] {
            assert!(run(&pda, mode, ""));
            assert!(run(&pda, mode, "ab"));
            assert!(run(&pda, mode, "aaabbb"));
            assert!(!run(&pda, mode, "aab"));
            assert!(!run(&pda, mode, "ba"));
        }
    }

    #[test]
    fn test_pda_without_empty_word() {
        let single = grammar_to_pda(&Grammar::parse("S -> a").unwrap()).unwrap();
        let nested = grammar_to_pda(&Grammar::parse("S -> aSb | ab").unwrap()).unwrap();
        for mode in [
            AcceptanceMode::FinalState,
            AcceptanceMode::EmptyStack,
            AcceptanceMode::FinalStateAndEmptyStack,
        ] {
            assert!(!run(&single, mode, ""), "{mode:?}");
            assert!(run(&single, mode, "a"));
            assert!(!run(&single, mode, "aa"));

            assert!(!run(&nested, mode, ""), "{mode:?}");
            assert!(run(&nested, mode, "aabb"));
            assert!(!run(&nested, mode, "aabbb"));
        }
    }

    #[test]
    fn test_incremental_transitions() {
        let grammar = Grammar::parse("S -> aA\nA -> b").unwrap();
        let converter = LlPdaConverter::new(&grammar);
        let scaffold = converter.create_states().unwrap();
        assert!(scaffold.transitions().contains(&Transition::pda(0, 1, "", "$", "S$")));
        assert!(scaffold.transitions().contains(&Transition::pda(1, 1, "a", "a", "")));
        assert!(scaffold.transitions().contains(&Transition::pda(1, 2, "", "$", "")));

        let expand = converter.transition_for(&grammar.productions()[0]).unwrap();
        assert_eq!(expand, Transition::pda(1, 1, "", "S", "aA"));
    }

    #[test]
    fn test_ll_table() {
        let grammar = Grammar::parse("S -> aSb | c").unwrap();
        let table = ll_table(&grammar).unwrap();
        assert_eq!(table.entries('S', 'a'), &[0]);
        assert_eq!(table.entries('S', 'c'), &[1]);
        assert!(table.entries('S', 'b').is_empty());
        assert!(table.accepts("aacbb"));
        assert!(table.accepts("c"));
        assert!(!table.accepts("aacb"));
        assert!(!table.accepts("cc"));
    }

    #[test]
    fn test_ll_table_with_epsilon_uses_follow() {
        let grammar = Grammar::parse("S -> aS | λ").unwrap();
        let table = ll_table(&grammar).unwrap();
        assert_eq!(table.entries('S', '$'), &[1]);
        assert!(table.accepts(""));
        assert!(table.accepts("aaa"));
    }

    #[test]
    fn test_ll_conflict_reported() {
        let grammar = Grammar::parse("S -> aS | a").unwrap();
        assert_eq!(
            ll_table(&grammar).unwrap_err(),
            Error::GrammarConflict {
                row: "S".to_string(),
                symbol: 'a',
                existing: "S → aS".to_string(),
                incoming: "S → a".to_string(),
            }
        );
        let table = LlTable::build(&grammar);
        assert_eq!(table.conflicts(), vec![('S', 'a')]);
        assert!(table.get('S', 'a').is_none());
    }
}
