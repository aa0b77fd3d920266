//! Nondeterministic simulation of finite state, pushdown and Turing machines.
//!
//! A [`Simulator`] owns a snapshot of the automaton it runs, so later edits to
//! the caller's automaton never leak into a search. Step semantics differ per
//! [`AutomatonKind`]; the breadth-first driver in [`search`] is shared.

mod configuration;
mod search;

pub use configuration::{ConfigData, Configuration, Stack, Tape};
pub use search::{ConfigId, Outcome, Search};

use crate::automaton::{Automaton, AutomatonKind, Label, StateId, Transition};
use crate::config::{AcceptanceMode, SearchConfig};
use crate::error::Result;
use log::trace;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Simulator {
    automaton: Automaton,
    config: SearchConfig,
    /// Indices into `automaton.transitions()` grouped by source state.
    outgoing: HashMap<StateId, Vec<usize>>,
}

impl Simulator {
    /// Snapshot `automaton` for simulation. Fails if it has no initial state
    /// or is otherwise structurally broken.
    pub fn new(automaton: &Automaton, config: SearchConfig) -> Result<Self> {
        let automaton = automaton.clone();
        automaton.validate()?;
        let mut outgoing: HashMap<StateId, Vec<usize>> = HashMap::new();
        for (index, transition) in automaton.transitions().iter().enumerate() {
            outgoing.entry(transition.from).or_default().push(index);
        }
        Ok(Self {
            automaton,
            config,
            outgoing,
        })
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn kind(&self) -> AutomatonKind {
        self.automaton.kind()
    }

    /// The root configurations for `input`. Always exactly one, at the
    /// initial state, holding the automaton's initial stack if it has one.
    pub fn initial_configurations(&self, input: &str) -> Vec<Configuration> {
        let Some(initial) = self.automaton.initial() else {
            return Vec::new();
        };
        let config = match self.kind() {
            AutomatonKind::Fsa => Configuration::fsa(initial, input),
            AutomatonKind::Pda => {
                let mut stack = Stack::new();
                stack.push(self.automaton.initial_stack());
                Configuration::pda(initial, input, stack)
            }
            AutomatonKind::Turing => Configuration::turing(initial, Tape::new(input)),
        };
        vec![config]
    }

    fn outgoing(&self, state: StateId) -> impl Iterator<Item = &Transition> + '_ {
        let transitions = self.automaton.transitions();
        self.outgoing
            .get(&state)
            .into_iter()
            .flatten()
            .map(move |&index| &transitions[index])
    }

    /// Every configuration reachable from `config` in one move. The argument
    /// is left untouched; each child owns its own stack or tape.
    pub fn step(&self, config: &Configuration) -> Vec<Configuration> {
        let mut children = Vec::new();
        for transition in self.outgoing(config.state()) {
            if let Some(child) = apply(transition, config) {
                trace!("{config} --{}--> {child}", transition.label);
                children.push(child);
            }
        }
        children
    }

    /// Whether `config` accepts. Input-reading machines need all input
    /// consumed; pushdown automata then follow the configured
    /// [`AcceptanceMode`]. Turing machines accept on reaching a final state.
    pub fn is_accepting(&self, config: &Configuration) -> bool {
        let is_final = self.automaton.is_final(config.state());
        match config.data() {
            ConfigData::Fsa { remaining } => remaining.is_empty() && is_final,
            ConfigData::Pda { remaining, stack } => {
                remaining.is_empty()
                    && match self.config.acceptance {
                        AcceptanceMode::FinalState => is_final,
                        AcceptanceMode::EmptyStack => stack.is_empty(),
                        AcceptanceMode::FinalStateAndEmptyStack => is_final && stack.is_empty(),
                    }
            }
            ConfigData::Turing { .. } => is_final,
        }
    }

    /// Start a search over `input` that the caller can drive generation by
    /// generation.
    pub fn search(&self, input: &str) -> Search<'_> {
        Search::new(self, self.initial_configurations(input))
    }

    /// Decide whether the automaton accepts `input`.
    ///
    /// Fails with `SearchBoundExceeded` rather than answering `false` when
    /// the bound runs out first; use [`Simulator::search`] to continue past it.
    pub fn run(&self, input: &str) -> Result<bool> {
        Ok(self.search(input).run()?.is_accepted())
    }
}

fn apply(transition: &Transition, config: &Configuration) -> Option<Configuration> {
    let to = transition.to;
    match (&transition.label, config.data()) {
        (Label::Fsa { read }, ConfigData::Fsa { remaining }) => {
            let rest = remaining.strip_prefix(read.as_str())?;
            Some(Configuration::fsa(to, rest))
        }
        (Label::Pda { read, pop, push }, ConfigData::Pda { remaining, stack }) => {
            let rest = remaining.strip_prefix(read.as_str())?;
            if !stack.peek_matches(pop) {
                return None;
            }
            let mut stack = stack.clone();
            stack.pop(pop.chars().count());
            stack.push(push);
            Some(Configuration::pda(to, rest, stack))
        }
        (
            Label::Turing {
                read,
                write,
                direction,
            },
            ConfigData::Turing { tape },
        ) => {
            if tape.read() != *read {
                return None;
            }
            let mut tape = tape.clone();
            tape.write(*write);
            tape.shift(*direction);
            Some(Configuration::turing(to, tape))
        }
        _ => None,
    }
}
