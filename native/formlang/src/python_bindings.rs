//! PyO3 bindings for the presentation layer.
//!
//! Automata and grammars cross the boundary as opaque wrapper objects; state
//! ids are plain integers and labels are strings.

use crate::analysis;
use crate::automaton::{Automaton, AutomatonKind, Direction, Point, StateId, Transition};
use crate::config::{AcceptanceMode, DEFAULT_SEARCH_BOUND, SearchConfig};
use crate::formlang::Regex;
use crate::generator;
use crate::grammar::{self, Grammar};
use crate::sim::Simulator;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn parse_acceptance(mode: &str) -> PyResult<AcceptanceMode> {
    match mode {
        "final_state" => Ok(AcceptanceMode::FinalState),
        "empty_stack" => Ok(AcceptanceMode::EmptyStack),
        "final_state_and_empty_stack" => Ok(AcceptanceMode::FinalStateAndEmptyStack),
        other => Err(PyValueError::new_err(format!(
            "unknown acceptance mode {other:?}"
        ))),
    }
}

fn parse_direction(direction: char) -> PyResult<Direction> {
    match direction.to_ascii_uppercase() {
        'L' => Ok(Direction::Left),
        'R' => Ok(Direction::Right),
        'S' => Ok(Direction::Stay),
        other => Err(PyValueError::new_err(format!(
            "direction must be L, R or S, not {other:?}"
        ))),
    }
}

/// A finite state, pushdown or Turing automaton.
#[pyclass(name = "Automaton", module = "formlang.automaton", from_py_object)]
#[derive(Clone)]
pub struct PyAutomaton {
    inner: Automaton,
}

#[pymethods]
impl PyAutomaton {
    #[new]
    #[pyo3(signature = (kind = "fsa"))]
    fn new(kind: &str) -> PyResult<Self> {
        let kind = match kind {
            "fsa" => AutomatonKind::Fsa,
            "pda" => AutomatonKind::Pda,
            "turing" => AutomatonKind::Turing,
            other => {
                return Err(PyValueError::new_err(format!(
                    "unknown automaton kind {other:?}"
                )));
            }
        };
        Ok(Self {
            inner: Automaton::new(kind),
        })
    }

    #[getter]
    fn kind(&self) -> &'static str {
        match self.inner.kind() {
            AutomatonKind::Fsa => "fsa",
            AutomatonKind::Pda => "pda",
            AutomatonKind::Turing => "turing",
        }
    }

    #[pyo3(signature = (x = 0.0, y = 0.0))]
    fn create_state(&mut self, x: f64, y: f64) -> StateId {
        self.inner.create_state(Point::new(x, y))
    }

    fn remove_state(&mut self, state: StateId) -> PyResult<()> {
        self.inner.remove_state(state)?;
        Ok(())
    }

    fn states(&self) -> Vec<StateId> {
        self.inner.state_ids().collect()
    }

    fn state_name(&self, state: StateId) -> String {
        self.inner.state_name(state)
    }

    fn set_initial(&mut self, state: StateId) -> PyResult<()> {
        Ok(self.inner.set_initial(state)?)
    }

    #[getter]
    fn initial(&self) -> Option<StateId> {
        self.inner.initial()
    }

    fn add_final(&mut self, state: StateId) -> PyResult<()> {
        Ok(self.inner.add_final(state)?)
    }

    fn remove_final(&mut self, state: StateId) -> PyResult<()> {
        Ok(self.inner.remove_final(state)?)
    }

    fn is_final(&self, state: StateId) -> bool {
        self.inner.is_final(state)
    }

    /// Stack contents before the first move, top first. Pushdown only.
    #[getter]
    fn initial_stack(&self) -> &str {
        self.inner.initial_stack()
    }

    #[setter]
    fn set_initial_stack(&mut self, contents: &str) -> PyResult<()> {
        Ok(self.inner.set_initial_stack(contents)?)
    }

    /// Add an FSA move; an empty `read` is a λ move.
    fn add_fsa_transition(
        &mut self,
        source: StateId,
        destination: StateId,
        read: &str,
    ) -> PyResult<()> {
        Ok(self
            .inner
            .add_transition(Transition::fsa(source, destination, read))?)
    }

    fn add_pda_transition(
        &mut self,
        source: StateId,
        destination: StateId,
        read: &str,
        pop: &str,
        push: &str,
    ) -> PyResult<()> {
        Ok(self
            .inner
            .add_transition(Transition::pda(source, destination, read, pop, push))?)
    }

    fn add_turing_transition(
        &mut self,
        source: StateId,
        destination: StateId,
        read: char,
        write: char,
        direction: char,
    ) -> PyResult<()> {
        let direction = parse_direction(direction)?;
        Ok(self
            .inner
            .add_transition(Transition::turing(source, destination, read, write, direction))?)
    }

    /// `(source, destination, label)` for every move out of `state`.
    fn transitions_from(&self, state: StateId) -> Vec<(StateId, StateId, String)> {
        self.inner
            .transitions_from(state)
            .into_iter()
            .map(|t| (t.from, t.to, t.label.to_string()))
            .collect()
    }

    /// Raises `RuntimeError` if the search bound runs out before a decision.
    #[pyo3(signature = (input, bound = DEFAULT_SEARCH_BOUND, acceptance = "final_state"))]
    fn run(&self, input: &str, bound: usize, acceptance: &str) -> PyResult<bool> {
        let config = SearchConfig::default()
            .with_bound(bound)
            .with_acceptance(parse_acceptance(acceptance)?);
        Ok(Simulator::new(&self.inner, config)?.run(input)?)
    }

    fn to_dfa(&self) -> PyResult<Self> {
        Ok(Self {
            inner: crate::formlang::convert_nfa_to_dfa(&self.inner)?,
        })
    }

    /// The minimal DFA and, for each of its states, the merged states.
    fn minimize(&self) -> PyResult<(Self, Vec<Vec<StateId>>)> {
        let result = crate::formlang::minimize(&self.inner)?;
        Ok((
            Self {
                inner: result.automaton,
            },
            result.blocks,
        ))
    }

    fn is_deterministic(&self) -> bool {
        analysis::is_deterministic(&self.inner)
    }

    fn nondeterministic_states(&self) -> Vec<StateId> {
        analysis::nondeterministic_states(&self.inner)
    }

    fn alphabet(&self) -> BTreeSet<char> {
        analysis::alphabet(&self.inner)
    }

    /// Right-linear grammar for an FSA, triple construction for a PDA.
    fn to_grammar(&self) -> PyResult<PyGrammar> {
        let inner = match self.inner.kind() {
            AutomatonKind::Pda => grammar::pda_to_grammar(&self.inner)?,
            _ => grammar::fsa_to_grammar(&self.inner)?,
        };
        Ok(PyGrammar { inner })
    }

    fn to_regex(&self) -> PyResult<String> {
        Ok(crate::formlang::fsa_to_regex(&self.inner)?.to_string())
    }

    /// Up to `count` accepted words, shortest first, and whether the list is
    /// known to be complete.
    #[pyo3(signature = (
        count,
        max_length,
        bound = DEFAULT_SEARCH_BOUND,
        acceptance = "final_state",
    ))]
    fn words(
        &self,
        count: usize,
        max_length: usize,
        bound: usize,
        acceptance: &str,
    ) -> PyResult<(Vec<String>, bool)> {
        let config = SearchConfig::default()
            .with_bound(bound)
            .with_acceptance(parse_acceptance(acceptance)?);
        let result = generator::automaton_words(&self.inner, count, max_length, &config)?;
        Ok((result.words, result.complete))
    }

    fn __copy__(&self) -> Self {
        self.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "Automaton({}, states={}, transitions={})",
            self.kind(),
            self.inner.num_states(),
            self.inner.transitions().len()
        )
    }
}

/// A context-free grammar over single-character symbols.
#[pyclass(name = "Grammar", module = "formlang.grammar", frozen, from_py_object)]
#[derive(Clone)]
pub struct PyGrammar {
    inner: Grammar,
}

#[pymethods]
impl PyGrammar {
    /// Parse `A -> α | β` rules, one per line.
    #[new]
    fn new(text: &str) -> PyResult<Self> {
        Ok(Self {
            inner: Grammar::parse(text)?,
        })
    }

    #[getter]
    fn start(&self) -> char {
        self.inner.start()
    }

    fn productions(&self) -> Vec<(char, String)> {
        self.inner
            .productions()
            .iter()
            .map(|p| (p.lhs(), p.rhs().to_string()))
            .collect()
    }

    fn is_right_linear(&self) -> bool {
        self.inner.is_right_linear()
    }

    fn to_fsa(&self) -> PyResult<PyAutomaton> {
        Ok(PyAutomaton {
            inner: grammar::grammar_to_fsa(&self.inner)?,
        })
    }

    fn to_pda(&self) -> PyResult<PyAutomaton> {
        Ok(PyAutomaton {
            inner: grammar::grammar_to_pda(&self.inner)?,
        })
    }

    #[pyo3(signature = (count, max_length, bound = DEFAULT_SEARCH_BOUND))]
    fn words(&self, count: usize, max_length: usize, bound: usize) -> (Vec<String>, bool) {
        let result = generator::grammar_words(&self.inner, count, max_length, bound);
        (result.words, result.complete)
    }

    fn first(&self) -> BTreeMap<char, BTreeSet<char>> {
        grammar::first(&self.inner)
    }

    fn follow(&self) -> BTreeMap<char, BTreeSet<char>> {
        grammar::follow(&self.inner)
    }

    /// SLR(1) action cells as `(state, symbol, action)`, e.g. `(1, '+', "s4")`.
    /// Raises `ValueError` on a conflict.
    fn lr_table(&self) -> PyResult<Vec<(usize, char, String)>> {
        let table = grammar::lr_table(&self.inner)?;
        Ok(table
            .action_cells()
            .flat_map(|(state, symbol, actions)| {
                actions
                    .iter()
                    .map(move |action| (state, symbol, action.to_string()))
            })
            .collect())
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

#[pyfunction]
fn fsa_equal(a: PyRef<'_, PyAutomaton>, b: PyRef<'_, PyAutomaton>) -> PyResult<bool> {
    Ok(crate::formlang::fsa_equal(&a.inner, &b.inner)?)
}

/// Thompson automaton for an expression such as `(a+b)*abb`.
#[pyfunction]
fn regex_to_fsa(expression: &str) -> PyResult<PyAutomaton> {
    let regex = Regex::parse(expression)?;
    Ok(PyAutomaton {
        inner: crate::formlang::regex_to_fsa(&regex)?,
    })
}

/// Register the automaton submodule.
pub fn automaton(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAutomaton>()?;
    m.add_function(wrap_pyfunction!(fsa_equal, m)?)?;
    m.add_function(wrap_pyfunction!(regex_to_fsa, m)?)?;
    Ok(())
}

/// Register the grammar submodule.
pub fn grammar(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGrammar>()?;
    Ok(())
}
