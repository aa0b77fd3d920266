//! Productions over single-character symbols.

use crate::automaton::symbol::{END_MARKER, LAMBDA, display_string};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grammar variables are the ASCII capitals.
pub fn is_variable(c: char) -> bool {
    c.is_ascii_uppercase()
}

pub fn is_terminal(c: char) -> bool {
    !is_variable(c)
}

/// `lhs → rhs`, with an empty `rhs` for an epsilon production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawProduction")]
pub struct Production {
    lhs: char,
    rhs: String,
}

/// Unchecked wire form; deserialization goes through [`Production::new`].
#[derive(Deserialize)]
struct RawProduction {
    lhs: char,
    rhs: String,
}

impl TryFrom<RawProduction> for Production {
    type Error = Error;

    fn try_from(raw: RawProduction) -> Result<Self> {
        Production::new(raw.lhs, raw.rhs)
    }
}

fn malformed(lhs: impl fmt::Display, rhs: &str, reason: &str) -> Error {
    Error::MalformedProduction {
        production: format!("{lhs}->{rhs}"),
        reason: reason.to_string(),
    }
}

impl Production {
    pub fn new(lhs: char, rhs: impl Into<String>) -> Result<Self> {
        let rhs = rhs.into();
        if !is_variable(lhs) {
            return Err(malformed(lhs, &rhs, "left-hand side must be a variable A-Z"));
        }
        if rhs.contains(END_MARKER) {
            return Err(malformed(lhs, &rhs, "'$' is reserved for the end marker"));
        }
        if rhs.contains(LAMBDA) || rhs.chars().any(char::is_whitespace) {
            return Err(malformed(lhs, &rhs, "right-hand side holds a non-symbol"));
        }
        Ok(Self { lhs, rhs })
    }

    /// Parse `"S->aS"` (or `"S → aS"`). Whitespace on the right-hand side is
    /// dropped, and a right-hand side that is empty or `λ` is epsilon.
    pub fn parse(text: &str) -> Result<Self> {
        let (lhs, rhs) = split_arrow(text)
            .ok_or_else(|| malformed(text.trim(), "", "missing '->'"))?;
        let rhs = normalize_rhs(rhs);
        if rhs.contains('|') {
            return Err(malformed(lhs, &rhs, "alternatives belong in a grammar"));
        }
        Self::new(parse_lhs(lhs, &rhs)?, rhs)
    }

    pub fn lhs(&self) -> char {
        self.lhs
    }

    pub fn rhs(&self) -> &str {
        &self.rhs
    }

    /// Number of symbols on the right-hand side.
    pub fn len(&self) -> usize {
        self.rhs.chars().count()
    }

    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }

    /// Symbol at `position` on the right-hand side.
    pub fn symbol(&self, position: usize) -> Option<char> {
        self.rhs.chars().nth(position)
    }

    pub fn variables(&self) -> impl Iterator<Item = char> + '_ {
        self.rhs.chars().filter(|&c| is_variable(c))
    }

    pub fn terminals(&self) -> impl Iterator<Item = char> + '_ {
        self.rhs.chars().filter(|&c| is_terminal(c))
    }

    /// Split a right-linear right-hand side into its terminal prefix and
    /// optional trailing variable. `None` if the production is not
    /// right-linear.
    pub fn right_linear_parts(&self) -> Option<(&str, Option<char>)> {
        match self.rhs.char_indices().find(|&(_, c)| is_variable(c)) {
            None => Some((&self.rhs, None)),
            Some((at, var)) if at + var.len_utf8() == self.rhs.len() => {
                Some((&self.rhs[..at], Some(var)))
            }
            Some(_) => None,
        }
    }

    pub fn is_right_linear(&self) -> bool {
        self.right_linear_parts().is_some()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.lhs, display_string(&self.rhs))
    }
}

pub(crate) fn split_arrow(text: &str) -> Option<(&str, &str)> {
    text.split_once("->").or_else(|| text.split_once('→'))
}

pub(crate) fn normalize_rhs(rhs: &str) -> String {
    let rhs: String = rhs.chars().filter(|c| !c.is_whitespace()).collect();
    if rhs == LAMBDA { String::new() } else { rhs }
}

pub(crate) fn parse_lhs(lhs: &str, rhs: &str) -> Result<char> {
    let lhs = lhs.trim();
    let mut chars = lhs.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        (None, _) => Err(malformed(lhs, rhs, "empty left-hand side")),
        _ => Err(malformed(lhs, rhs, "left-hand side must be a single variable")),
    }
}
