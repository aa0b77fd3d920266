//! Simulation configurations: snapshots used as search tree nodes.

use crate::automaton::symbol::BLANK;
use crate::automaton::{Direction, StateId};
use std::collections::VecDeque;
use std::fmt;

/// A pushdown stack of single characters.
///
/// Strings handed to [`Stack::push`] and compared by [`Stack::peek_matches`] list the
/// topmost character first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Stack {
    /// Bottom at index 0, top at the end.
    cells: Vec<char>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether the top `s.chars().count()` characters spell `s`.
    pub fn peek_matches(&self, s: &str) -> bool {
        let mut top_down = self.cells.iter().rev();
        s.chars().all(|c| top_down.next() == Some(&c))
    }

    /// Remove `n` characters from the top, returning them topmost first.
    /// Returns fewer characters if the stack is shorter.
    pub fn pop(&mut self, n: usize) -> String {
        let keep = self.cells.len().saturating_sub(n);
        self.cells.drain(keep..).rev().collect()
    }

    /// Push `s` so that its first character ends up on top.
    pub fn push(&mut self, s: &str) {
        self.cells.extend(s.chars().rev());
    }

    /// Contents listed from the top down.
    pub fn contents(&self) -> String {
        self.cells.iter().rev().collect()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents())
    }
}

/// A Turing machine tape that grows on demand in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tape {
    cells: VecDeque<char>,
    head: usize,
}

impl Tape {
    /// A tape holding `input` with the head on its first cell. An empty input
    /// gives a single blank cell.
    pub fn new(input: &str) -> Self {
        let mut cells: VecDeque<char> = input.chars().collect();
        if cells.is_empty() {
            cells.push_back(BLANK);
        }
        Self { cells, head: 0 }
    }

    pub fn read(&self) -> char {
        self.cells[self.head]
    }

    pub fn write(&mut self, c: char) {
        self.cells[self.head] = c;
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    self.cells.push_front(BLANK);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                self.head += 1;
                if self.head == self.cells.len() {
                    self.cells.push_back(BLANK);
                }
            }
            Direction::Stay => {}
        }
    }

    /// Tape contents with leading and trailing blanks removed.
    pub fn output(&self) -> String {
        let contents: String = self.cells.iter().collect();
        contents.trim_matches(BLANK).to_string()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, c) in self.cells.iter().enumerate() {
            if index == self.head {
                write!(f, "[{c}]")?;
            } else {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// Kind-specific part of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigData {
    Fsa { remaining: String },
    Pda { remaining: String, stack: Stack },
    Turing { tape: Tape },
}

/// One node of the search: a state plus whatever else the machine carries.
///
/// Equality and hashing cover the state and residual data only; ancestry is
/// tracked by the search arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Configuration {
    state: StateId,
    data: ConfigData,
}

impl Configuration {
    pub fn new(state: StateId, data: ConfigData) -> Self {
        Self { state, data }
    }

    pub fn fsa(state: StateId, remaining: impl Into<String>) -> Self {
        Self::new(
            state,
            ConfigData::Fsa {
                remaining: remaining.into(),
            },
        )
    }

    pub fn pda(state: StateId, remaining: impl Into<String>, stack: Stack) -> Self {
        Self::new(
            state,
            ConfigData::Pda {
                remaining: remaining.into(),
                stack,
            },
        )
    }

    pub fn turing(state: StateId, tape: Tape) -> Self {
        Self::new(state, ConfigData::Turing { tape })
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Unread input, for machines that read their input left to right.
    pub fn remaining(&self) -> Option<&str> {
        match &self.data {
            ConfigData::Fsa { remaining } | ConfigData::Pda { remaining, .. } => Some(remaining),
            ConfigData::Turing { .. } => None,
        }
    }

    pub fn stack(&self) -> Option<&Stack> {
        match &self.data {
            ConfigData::Pda { stack, .. } => Some(stack),
            _ => None,
        }
    }

    pub fn tape(&self) -> Option<&Tape> {
        match &self.data {
            ConfigData::Turing { tape } => Some(tape),
            _ => None,
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.state)?;
        match &self.data {
            ConfigData::Fsa { remaining } => write!(f, " INPUT: {remaining}"),
            ConfigData::Pda { remaining, stack } => {
                write!(f, " INPUT: {remaining} STACK: {stack}")
            }
            ConfigData::Turing { tape } => write!(f, " TAPE: {tape}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_push_pop_order() {
        let mut stack = Stack::new();
        stack.push("XZ");
        assert_eq!(stack.contents(), "XZ");
        assert!(stack.peek_matches("X"));
        assert!(stack.peek_matches("XZ"));
        assert!(!stack.peek_matches("Z"));
        assert!(!stack.peek_matches("XZZ"));
        assert!(stack.peek_matches(""));

        stack.push("a");
        assert_eq!(stack.pop(2), "aX");
        assert_eq!(stack.contents(), "Z");
        assert_eq!(stack.pop(5), "Z");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_copies_are_independent() {
        let mut original = Stack::new();
        original.push("A");
        let mut branch = original.clone();
        branch.push("B");
        assert_eq!(original.height(), 1);
        assert_eq!(branch.contents(), "BA");
    }

    #[test]
    fn test_tape_grows_both_ways() {
        let mut tape = Tape::new("ab");
        assert_eq!(tape.read(), 'a');
        tape.shift(Direction::Left);
        assert_eq!(tape.read(), BLANK);
        assert_eq!(tape.head(), 0);
        tape.shift(Direction::Right);
        tape.shift(Direction::Right);
        tape.shift(Direction::Right);
        assert_eq!(tape.read(), BLANK);
        tape.write('c');
        assert_eq!(tape.output(), "abc");
        assert_eq!(Tape::new("").read(), BLANK);
    }

    #[test]
    fn test_configuration_equality_ignores_nothing_but_ancestry() {
        let a = Configuration::fsa(1, "ab");
        let b = Configuration::fsa(1, "ab");
        let c = Configuration::fsa(1, "b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.remaining(), Some("ab"));
        assert!(a.stack().is_none());
        assert_eq!(a.to_string(), "q1 INPUT: ab");
    }
}
