//! Transitions and their kind-specific payloads.

use super::symbol::display_string;
use super::{AutomatonKind, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Head movement of a Turing machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Stay,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'S',
        };
        write!(f, "{c}")
    }
}

/// What a transition reads, and for stack and tape machines, what it does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Reads `read` from the input; empty for an epsilon move.
    Fsa { read: String },
    /// Reads `read`, pops `pop` (first char is the top) and pushes `push`
    /// (first char ends up on top).
    Pda {
        read: String,
        pop: String,
        push: String,
    },
    /// Reads `read` under the head, writes `write`, then moves.
    Turing {
        read: char,
        write: char,
        direction: Direction,
    },
}

impl Label {
    pub fn kind(&self) -> AutomatonKind {
        match self {
            Label::Fsa { .. } => AutomatonKind::Fsa,
            Label::Pda { .. } => AutomatonKind::Pda,
            Label::Turing { .. } => AutomatonKind::Turing,
        }
    }

    /// The input consumed by an FSA or PDA move. Turing moves consume no input.
    pub fn read(&self) -> Option<&str> {
        match self {
            Label::Fsa { read } | Label::Pda { read, .. } => Some(read),
            Label::Turing { .. } => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Fsa { read } => write!(f, "{}", display_string(read)),
            Label::Pda { read, pop, push } => write!(
                f,
                "{}, {}; {}",
                display_string(read),
                display_string(pop),
                display_string(push)
            ),
            Label::Turing {
                read,
                write,
                direction,
            } => write!(f, "{read}; {write}, {direction}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub label: Label,
}

impl Transition {
    pub fn new(from: StateId, to: StateId, label: Label) -> Self {
        Self { from, to, label }
    }

    pub fn fsa(from: StateId, to: StateId, read: impl Into<String>) -> Self {
        Self::new(from, to, Label::Fsa { read: read.into() })
    }

    pub fn pda(
        from: StateId,
        to: StateId,
        read: impl Into<String>,
        pop: impl Into<String>,
        push: impl Into<String>,
    ) -> Self {
        Self::new(
            from,
            to,
            Label::Pda {
                read: read.into(),
                pop: pop.into(),
                push: push.into(),
            },
        )
    }

    pub fn turing(
        from: StateId,
        to: StateId,
        read: char,
        write: char,
        direction: Direction,
    ) -> Self {
        Self::new(
            from,
            to,
            Label::Turing {
                read,
                write,
                direction,
            },
        )
    }

    pub fn kind(&self) -> AutomatonKind {
        self.label.kind()
    }

    /// True for FSA and PDA moves that consume no input.
    pub fn is_lambda(&self) -> bool {
        self.label.read().is_some_and(str::is_empty)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{} -> q{} [{}]", self.from, self.to, self.label)
    }
}
