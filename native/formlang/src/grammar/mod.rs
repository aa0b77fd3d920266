//! Context-free grammars and their conversions to and from automata.
//!
//! Symbols are single characters: `A`-`Z` are variables and everything else
//! is a terminal, with `$` reserved as the end-of-input marker.

mod first_follow;
pub mod ll;
pub mod lr;
mod pda;
mod production;
pub mod regular;
pub mod right_linear;

pub use first_follow::{FirstFollow, first, follow, nullable};
pub use ll::{LlPdaConverter, LlTable, grammar_to_pda, ll_table};
pub use lr::{Action, AugmentedGrammar, Item, ItemSet, LrConstruction, LrStep, LrTable, lr_table};
pub use pda::pda_to_grammar;
pub use production::{Production, is_terminal, is_variable};
pub use regular::fsa_to_grammar;
pub use right_linear::{RightLinearConverter, grammar_to_fsa};

use crate::automaton::{Automaton, Transition};
use crate::error::{Error, Result};
use production::{normalize_rhs, parse_lhs, split_arrow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A start variable plus an ordered list of distinct productions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrammar")]
pub struct Grammar {
    start: char,
    productions: Vec<Production>,
}

#[derive(Deserialize)]
struct RawGrammar {
    start: char,
    productions: Vec<Production>,
}

impl TryFrom<RawGrammar> for Grammar {
    type Error = Error;

    fn try_from(raw: RawGrammar) -> Result<Self> {
        Grammar::from_productions(raw.start, raw.productions)
    }
}

impl Grammar {
    pub fn new(start: char) -> Result<Self> {
        if !is_variable(start) {
            return Err(Error::MalformedProduction {
                production: start.to_string(),
                reason: "start symbol must be a variable A-Z".to_string(),
            });
        }
        Ok(Self {
            start,
            productions: Vec::new(),
        })
    }

    pub fn from_productions(
        start: char,
        productions: impl IntoIterator<Item = Production>,
    ) -> Result<Self> {
        let mut grammar = Self::new(start)?;
        for production in productions {
            grammar.add_production(production);
        }
        Ok(grammar)
    }

    /// Parse one rule per line, `A -> α | β | ...`. Blank lines are skipped
    /// and the first left-hand side is the start variable.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let (lhs, alternatives) = split_arrow(line).ok_or_else(|| Error::MalformedProduction {
                production: line.trim().to_string(),
                reason: "missing '->'".to_string(),
            })?;
            rules.push((parse_lhs(lhs, alternatives)?, alternatives));
        }
        let Some(&(start, _)) = rules.first() else {
            return Err(Error::MalformedProduction {
                production: String::new(),
                reason: "grammar has no productions".to_string(),
            });
        };

        let mut grammar = Grammar::new(start)?;
        for (lhs, alternatives) in rules {
            for alternative in alternatives.split('|') {
                grammar.add_production(Production::new(lhs, normalize_rhs(alternative))?);
            }
        }
        Ok(grammar)
    }

    pub fn start(&self) -> char {
        self.start
    }

    /// Append a production. Returns false if it was already present.
    pub fn add_production(&mut self, production: Production) -> bool {
        if self.productions.contains(&production) {
            return false;
        }
        self.productions.push(production);
        true
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn productions_for(&self, variable: char) -> impl Iterator<Item = &Production> + '_ {
        self.productions.iter().filter(move |p| p.lhs() == variable)
    }

    /// The start variable and every variable named by a production.
    pub fn variables(&self) -> BTreeSet<char> {
        let mut variables = BTreeSet::from([self.start]);
        for production in &self.productions {
            variables.insert(production.lhs());
            variables.extend(production.variables());
        }
        variables
    }

    pub fn terminals(&self) -> BTreeSet<char> {
        self.productions
            .iter()
            .flat_map(Production::terminals)
            .collect()
    }

    pub fn is_right_linear(&self) -> bool {
        self.productions.iter().all(Production::is_right_linear)
    }

    /// The first capital letter the grammar does not use yet.
    pub fn fresh_variable(&self) -> Result<char> {
        let used = self.variables();
        ('A'..='Z')
            .find(|c| !used.contains(c))
            .ok_or(Error::NoFreeVariable)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{production}")?;
        }
        Ok(())
    }
}

/// Two-phase construction of an automaton from a grammar: the fixed
/// scaffolding first, then one transition per production. Interactive
/// drivers call [`GrammarConverter::transition_for`] themselves to reveal
/// the construction a production at a time.
pub trait GrammarConverter {
    fn grammar(&self) -> &Grammar;

    /// States plus every transition that does not come from a production.
    fn create_states(&self) -> Result<Automaton>;

    /// The transition contributed by `production`.
    fn transition_for(&self, production: &Production) -> Result<Transition>;

    fn convert(&self) -> Result<Automaton> {
        let mut automaton = self.create_states()?;
        for production in self.grammar().productions() {
            automaton.add_transition(self.transition_for(production)?)?;
        }
        Ok(automaton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grammar() {
        let grammar = Grammar::parse("S -> aSb | λ\n\nS -> c\nS -> aSb").unwrap();
        assert_eq!(grammar.start(), 'S');
        let rhs: Vec<&str> = grammar.productions().iter().map(Production::rhs).collect();
        assert_eq!(rhs, vec!["aSb", "", "c"]);
        assert_eq!(grammar.variables(), BTreeSet::from(['S']));
        assert_eq!(grammar.terminals(), BTreeSet::from(['a', 'b', 'c']));
        assert_eq!(grammar.to_string(), "S → aSb\nS → λ\nS → c\n");
    }

    #[test]
    fn test_parse_rejects_empty_and_bad_lines() {
        assert!(matches!(
            Grammar::parse("  \n"),
            Err(Error::MalformedProduction { .. })
        ));
        assert!(matches!(
            Grammar::parse("S -> a\nb -> c"),
            Err(Error::MalformedProduction { .. })
        ));
        assert!(Grammar::new('s').is_err());
    }

    #[test]
    fn test_productions_for_and_right_linearity() {
        let grammar = Grammar::parse("S -> aA | b\nA -> bS").unwrap();
        assert_eq!(grammar.productions_for('A').count(), 1);
        assert_eq!(grammar.productions_for('B').count(), 0);
        assert!(grammar.is_right_linear());
        assert!(!Grammar::parse("S -> Sa").unwrap().is_right_linear());
    }

    #[test]
    fn test_deserialize_validates() {
        let grammar = Grammar::parse("S -> aSb | λ").unwrap();
        let json = serde_json::to_string(&grammar).unwrap();
        assert_eq!(serde_json::from_str::<Grammar>(&json).unwrap(), grammar);

        let lowercase_start = r#"{"start":"s","productions":[{"lhs":"S","rhs":"a"}]}"#;
        assert!(serde_json::from_str::<Grammar>(lowercase_start).is_err());
        let end_marker = r#"{"start":"S","productions":[{"lhs":"S","rhs":"$"}]}"#;
        assert!(serde_json::from_str::<Grammar>(end_marker).is_err());
        // duplicates collapse the same way add_production does
        let doubled = concat!(
            r#"{"start":"S","productions":"#,
            r#"[{"lhs":"S","rhs":"a"},{"lhs":"S","rhs":"a"}]}"#
        );
        assert_eq!(serde_json::from_str::<Grammar>(doubled).unwrap().productions().len(), 1);
    }

    #[test]
    fn test_fresh_variable() {
        let grammar = Grammar::parse("A -> B\nB -> C").unwrap();
        assert_eq!(grammar.fresh_variable().unwrap(), 'D');

        let letters: String = ('A'..='Z').collect();
        let full = Grammar::parse(&format!("A -> {letters}")).unwrap();
        assert_eq!(full.fresh_variable(), Err(Error::NoFreeVariable));
    }
}
