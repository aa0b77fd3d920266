//! Automata and grammar algorithms for teaching formal languages.
//!
//! The crate models finite state, pushdown and Turing automata as editable
//! graphs ([`Automaton`]) and runs every algorithm on a private snapshot:
//!
//! - nondeterministic simulation with a resumable safety bound ([`sim`])
//! - subset construction, Moore minimization and FSA equivalence
//!   ([`formlang`])
//! - regular expressions to and from FSAs ([`formlang::Regex`])
//! - right-linear grammar to FSA, CFG to PDA and back, and LL(1) / SLR(1)
//!   tables ([`grammar`])
//! - shortest-first word generation ([`generator`])

pub mod analysis;
pub mod automaton;
pub mod config;
pub mod error;
pub mod formlang;
pub mod generator;
pub mod grammar;
pub mod sim;

#[cfg(feature = "python")]
mod python_bindings;

pub use automaton::{Automaton, AutomatonKind, Direction, Label, Point, State, StateId, Transition};
pub use config::{AcceptanceMode, SearchConfig};
pub use error::{Error, InvalidAutomaton, Result};
pub use formlang::{
    Minimization, Regex, convert_nfa_to_dfa, fsa_equal, fsa_to_regex, minimize, regex_to_fsa,
};
pub use generator::{Words, automaton_words, grammar_words};
pub use grammar::{
    Grammar, Production, fsa_to_grammar, grammar_to_fsa, grammar_to_pda, lr_table, pda_to_grammar,
};
pub use sim::Simulator;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
fn import_submodule<'py>(
    py: Python<'py>,
    m: &Bound<'py, PyModule>,
    package: &str,
    name: &str,
    import_func: impl FnOnce(&Bound<'py, PyModule>) -> PyResult<()>,
) -> PyResult<()> {
    let submodule = PyModule::new(py, name)?;
    import_func(&submodule)?;

    // make `import formlang.automaton` work
    let sys_modules = PyModule::import(py, "sys")?.getattr("modules")?;
    sys_modules.set_item(format!("{package}.{name}"), submodule.clone())?;

    m.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
#[pyo3(name = "formlang")]
fn python_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    import_submodule(
        m.py(),
        m,
        "formlang",
        "automaton",
        python_bindings::automaton,
    )?;
    import_submodule(m.py(), m, "formlang", "grammar", python_bindings::grammar)?;
    Ok(())
}
