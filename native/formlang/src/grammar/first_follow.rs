//! Nullable variables and FIRST / FOLLOW sets.

use super::{Grammar, is_variable};
use crate::automaton::symbol::END_MARKER;
use std::collections::{BTreeMap, BTreeSet};

/// FIRST and FOLLOW for every variable of a grammar. FIRST sets hold
/// terminals only; whether something derives λ is tracked separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollow {
    nullable: BTreeSet<char>,
    first: BTreeMap<char, BTreeSet<char>>,
    follow: BTreeMap<char, BTreeSet<char>>,
}

impl FirstFollow {
    pub fn new(grammar: &Grammar) -> Self {
        let variables = grammar.variables();
        let mut sets = Self {
            nullable: BTreeSet::new(),
            first: variables.iter().map(|&v| (v, BTreeSet::new())).collect(),
            follow: variables.iter().map(|&v| (v, BTreeSet::new())).collect(),
        };
        sets.compute_nullable(grammar);
        sets.compute_first(grammar);
        sets.compute_follow(grammar);
        sets
    }

    fn compute_nullable(&mut self, grammar: &Grammar) {
        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.productions() {
                if !self.nullable.contains(&production.lhs())
                    && self.is_nullable(production.rhs())
                {
                    self.nullable.insert(production.lhs());
                    changed = true;
                }
            }
        }
    }

    fn compute_first(&mut self, grammar: &Grammar) {
        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.productions() {
                let found = self.first_of(production.rhs());
                let entry = self.first.entry(production.lhs()).or_default();
                let before = entry.len();
                entry.extend(found);
                changed |= entry.len() != before;
            }
        }
    }

    fn compute_follow(&mut self, grammar: &Grammar) {
        self.follow
            .entry(grammar.start())
            .or_default()
            .insert(END_MARKER);
        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.productions() {
                let rhs = production.rhs();
                for (at, symbol) in rhs.char_indices() {
                    if !is_variable(symbol) {
                        continue;
                    }
                    let beta = &rhs[at + symbol.len_utf8()..];
                    let mut found = self.first_of(beta);
                    if self.is_nullable(beta) {
                        found.extend(self.follow(production.lhs()).iter().copied());
                    }
                    let entry = self.follow.entry(symbol).or_default();
                    let before = entry.len();
                    entry.extend(found);
                    changed |= entry.len() != before;
                }
            }
        }
    }

    /// Whether every symbol of `symbols` derives λ. True for the empty string.
    pub fn is_nullable(&self, symbols: &str) -> bool {
        symbols.chars().all(|c| self.nullable.contains(&c))
    }

    /// Terminals that can begin a string derived from `symbols`.
    pub fn first_of(&self, symbols: &str) -> BTreeSet<char> {
        let mut out = BTreeSet::new();
        for c in symbols.chars() {
            if !is_variable(c) {
                out.insert(c);
                break;
            }
            if let Some(first) = self.first.get(&c) {
                out.extend(first.iter().copied());
            }
            if !self.nullable.contains(&c) {
                break;
            }
        }
        out
    }

    pub fn nullable(&self) -> &BTreeSet<char> {
        &self.nullable
    }

    pub fn first(&self, variable: char) -> &BTreeSet<char> {
        static EMPTY: BTreeSet<char> = BTreeSet::new();
        self.first.get(&variable).unwrap_or(&EMPTY)
    }

    /// FOLLOW(`variable`); `$` marks the end of input.
    pub fn follow(&self, variable: char) -> &BTreeSet<char> {
        static EMPTY: BTreeSet<char> = BTreeSet::new();
        self.follow.get(&variable).unwrap_or(&EMPTY)
    }

    pub fn first_sets(&self) -> &BTreeMap<char, BTreeSet<char>> {
        &self.first
    }

    pub fn follow_sets(&self) -> &BTreeMap<char, BTreeSet<char>> {
        &self.follow
    }
}

pub fn nullable(grammar: &Grammar) -> BTreeSet<char> {
    FirstFollow::new(grammar).nullable
}

pub fn first(grammar: &Grammar) -> BTreeMap<char, BTreeSet<char>> {
    FirstFollow::new(grammar).first
}

pub fn follow(grammar: &Grammar) -> BTreeMap<char, BTreeSet<char>> {
    FirstFollow::new(grammar).follow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(chars: &str) -> BTreeSet<char> {
        chars.chars().collect()
    }

    #[test]
    fn test_expression_grammar() {
        // E -> TX, X -> +TX | λ, T -> FY, Y -> *FY | λ, F -> (E) | i
        let grammar = Grammar::parse(
            "E -> TX\nX -> +TX | λ\nT -> FY\nY -> *FY | λ\nF -> (E) | i",
        )
        .unwrap();
        let sets = FirstFollow::new(&grammar);

        assert_eq!(sets.nullable(), &set("XY"));
        assert_eq!(sets.first('E'), &set("(i"));
        assert_eq!(sets.first('X'), &set("+"));
        assert_eq!(sets.first('Y'), &set("*"));
        assert_eq!(sets.follow('E'), &set("$)"));
        assert_eq!(sets.follow('X'), &set("$)"));
        assert_eq!(sets.follow('T'), &set("$)+"));
        assert_eq!(sets.follow('F'), &set("$)*+"));
        assert_eq!(sets.first_of("YX"), set("*+"));
        assert!(sets.is_nullable("YX"));
        assert!(!sets.is_nullable("YF"));
    }

    #[test]
    fn test_left_recursive_grammar() {
        let grammar = Grammar::parse("E -> E+T | T\nT -> id").unwrap();
        assert_eq!(follow(&grammar)[&'E'], set("$+"));
        assert_eq!(follow(&grammar)[&'T'], set("$+"));
        assert_eq!(first(&grammar)[&'E'], set("i"));
        assert!(nullable(&grammar).is_empty());
    }

    #[test]
    fn test_unknown_variable_has_empty_sets() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let sets = FirstFollow::new(&grammar);
        assert!(sets.first('Q').is_empty());
        assert!(sets.follow('Q').is_empty());
    }
}
