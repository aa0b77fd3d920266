//! Regular expressions over single-character symbols, and conversions
//! between them and finite state automata.
//!
//! The notation is the textbook one: juxtaposition concatenates, `+` is
//! union, postfix `*` is the Kleene star, `λ` is the empty word and `∅` the
//! empty language.

use crate::automaton::{Automaton, Label, StateId, Transition};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

const UNION: char = '+';
const STAR: char = '*';
const EMPTY_SET: char = '∅';
const LAMBDA: char = 'λ';

/// Characters that cannot appear as symbols inside an expression.
fn is_reserved(c: char) -> bool {
    matches!(c, UNION | STAR | '(' | ')' | LAMBDA | EMPTY_SET) || c.is_whitespace()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Regex {
    /// ∅, matches nothing.
    Empty,
    /// λ, matches only the empty word.
    Epsilon,
    Symbol(char),
    Concat(Box<Regex>, Box<Regex>),
    Union(Box<Regex>, Box<Regex>),
    Star(Box<Regex>),
}

impl Regex {
    /// `left` then `right`, with `∅` absorbing and `λ` dropped.
    pub fn concat(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Empty, _) | (_, Regex::Empty) => Regex::Empty,
            (Regex::Epsilon, other) | (other, Regex::Epsilon) => other,
            (left, right) => Regex::Concat(Box::new(left), Box::new(right)),
        }
    }

    /// `left + right`, with `∅` dropped and identical sides merged.
    pub fn union(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Empty, other) | (other, Regex::Empty) => other,
            (left, right) if left == right => left,
            (left, right) => Regex::Union(Box::new(left), Box::new(right)),
        }
    }

    pub fn star(inner: Regex) -> Regex {
        match inner {
            Regex::Empty | Regex::Epsilon => Regex::Epsilon,
            starred @ Regex::Star(_) => starred,
            inner => Regex::Star(Box::new(inner)),
        }
    }

    /// The word `text`, one symbol at a time. Empty text is `λ`.
    pub fn word(text: &str) -> Regex {
        text.chars()
            .map(Regex::Symbol)
            .fold(Regex::Epsilon, Regex::concat)
    }

    /// Parse the notation produced by `Display`. Whitespace is ignored.
    pub fn parse(text: &str) -> Result<Regex> {
        let mut parser = Parser {
            text,
            chars: text.chars().peekable(),
        };
        let regex = parser.union()?;
        match parser.peek() {
            None => Ok(regex),
            Some(c) => Err(parser.error(format!("unexpected {c:?}"))),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Regex::Union(..) => 0,
            Regex::Concat(..) => 1,
            Regex::Star(_) => 2,
            Regex::Empty | Regex::Epsilon | Regex::Symbol(_) => 3,
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "(")?;
            self.fmt_at(f, 0)?;
            return write!(f, ")");
        }
        match self {
            Regex::Empty => write!(f, "{EMPTY_SET}"),
            Regex::Epsilon => write!(f, "{LAMBDA}"),
            Regex::Symbol(c) => write!(f, "{c}"),
            Regex::Concat(left, right) => {
                left.fmt_at(f, 1)?;
                right.fmt_at(f, 1)
            }
            Regex::Union(left, right) => {
                left.fmt_at(f, 0)?;
                write!(f, "{UNION}")?;
                right.fmt_at(f, 0)
            }
            Regex::Star(inner) => {
                inner.fmt_at(f, 3)?;
                write!(f, "{STAR}")
            }
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::MalformedExpression {
            expression: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
        self.chars.peek().copied()
    }

    fn union(&mut self) -> Result<Regex> {
        let mut regex = self.concat()?;
        while self.peek() == Some(UNION) {
            self.chars.next();
            regex = Regex::union(regex, self.concat()?);
        }
        Ok(regex)
    }

    fn concat(&mut self) -> Result<Regex> {
        let mut regex = self.starred()?;
        while matches!(self.peek(), Some(c) if c != UNION && c != ')') {
            regex = Regex::concat(regex, self.starred()?);
        }
        Ok(regex)
    }

    fn starred(&mut self) -> Result<Regex> {
        let mut regex = self.atom()?;
        while self.peek() == Some(STAR) {
            self.chars.next();
            regex = Regex::star(regex);
        }
        Ok(regex)
    }

    fn atom(&mut self) -> Result<Regex> {
        let Some(c) = self.peek() else {
            return Err(self.error("expression ends where an operand is expected"));
        };
        self.chars.next();
        match c {
            '(' => {
                let inner = self.union()?;
                if self.peek() != Some(')') {
                    return Err(self.error("unclosed '('"));
                }
                self.chars.next();
                Ok(inner)
            }
            LAMBDA => Ok(Regex::Epsilon),
            EMPTY_SET => Ok(Regex::Empty),
            c if is_reserved(c) => Err(self.error(format!("operand expected before {c:?}"))),
            c => Ok(Regex::Symbol(c)),
        }
    }
}

fn merge(cell: &mut Option<Regex>, regex: Regex) {
    *cell = Some(match cell.take() {
        Some(existing) => Regex::union(existing, regex),
        None => regex,
    });
}

/// Convert an FSA to an equivalent expression by state elimination.
///
/// A fresh start and a fresh final state are wired to the automaton with λ
/// moves, then every original state `q` is removed in state order, rerouting
/// each path `p → q → r` as `R(p,q) R(q,q)* R(q,r)`.
pub fn fsa_to_regex(fsa: &Automaton) -> Result<Regex> {
    fsa.require_fsa()?;
    let initial = fsa.require_initial()?;

    let states: Vec<StateId> = fsa.state_ids().collect();
    let index = |id: StateId| states.iter().position(|&s| s == id);
    let (start, accept) = (states.len(), states.len() + 1);
    let size = states.len() + 2;
    let mut edges: Vec<Vec<Option<Regex>>> = vec![vec![None; size]; size];
    let mut add = |from: usize, to: usize, regex: Regex| merge(&mut edges[from][to], regex);

    if let Some(i) = index(initial) {
        add(start, i, Regex::Epsilon);
    }
    for state in fsa.finals().iter() {
        if let Some(i) = index(state) {
            add(i, accept, Regex::Epsilon);
        }
    }
    for transition in fsa.transitions() {
        let Label::Fsa { read } = &transition.label else {
            continue;
        };
        if read.chars().any(is_reserved) {
            return Err(Error::MalformedExpression {
                expression: read.clone(),
                reason: format!("transition {transition} uses a reserved character"),
            });
        }
        if let (Some(from), Some(to)) = (index(transition.from), index(transition.to)) {
            add(from, to, Regex::word(read));
        }
    }

    for q in 0..states.len() {
        let looped = Regex::star(edges[q][q].take().unwrap_or(Regex::Empty));
        let incoming: Vec<(usize, Regex)> = (0..size)
            .filter_map(|p| edges[p][q].take().map(|r| (p, r)))
            .collect();
        let outgoing: Vec<(usize, Regex)> = (0..size)
            .filter_map(|r| edges[q][r].take().map(|e| (r, e)))
            .collect();
        trace!(
            "eliminating {} with {} in and {} out",
            fsa.state_name(states[q]),
            incoming.len(),
            outgoing.len()
        );
        for (p, into) in &incoming {
            for (r, out) in &outgoing {
                let path = Regex::concat(
                    Regex::concat(into.clone(), looped.clone()),
                    out.clone(),
                );
                merge(&mut edges[*p][*r], path);
            }
        }
    }

    let regex = edges[start][accept].take().unwrap_or(Regex::Empty);
    debug!("FSA with {} states -> {regex}", states.len());
    Ok(regex)
}

/// Thompson's construction: an FSA with λ moves accepting the language of
/// `regex`, with one initial and one final state.
pub fn regex_to_fsa(regex: &Regex) -> Result<Automaton> {
    fn build(regex: &Regex, fsa: &mut Automaton) -> Result<(StateId, StateId)> {
        let (entry, exit) = match regex {
            Regex::Concat(left, right) => {
                let (left_in, left_out) = build(left, fsa)?;
                let (right_in, right_out) = build(right, fsa)?;
                fsa.add_transition(Transition::fsa(left_out, right_in, ""))?;
                return Ok((left_in, right_out));
            }
            _ => (fsa.add_state(), fsa.add_state()),
        };
        match regex {
            Regex::Empty | Regex::Concat(..) => {}
            Regex::Epsilon => fsa.add_transition(Transition::fsa(entry, exit, ""))?,
            Regex::Symbol(c) => fsa.add_transition(Transition::fsa(entry, exit, c.to_string()))?,
            Regex::Union(left, right) => {
                for branch in [left, right] {
                    let (inner_in, inner_out) = build(branch, fsa)?;
                    fsa.add_transition(Transition::fsa(entry, inner_in, ""))?;
                    fsa.add_transition(Transition::fsa(inner_out, exit, ""))?;
                }
            }
            Regex::Star(inner) => {
                let (inner_in, inner_out) = build(inner, fsa)?;
                fsa.add_transition(Transition::fsa(entry, inner_in, ""))?;
                fsa.add_transition(Transition::fsa(inner_out, inner_in, ""))?;
                fsa.add_transition(Transition::fsa(inner_out, exit, ""))?;
                fsa.add_transition(Transition::fsa(entry, exit, ""))?;
            }
        }
        Ok((entry, exit))
    }

    let mut fsa = Automaton::fsa();
    let (entry, exit) = build(regex, &mut fsa)?;
    fsa.set_initial(entry)?;
    fsa.add_final(exit)?;
    Ok(fsa)
}
