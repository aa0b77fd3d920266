//! Pushdown automaton to context-free grammar (the triple construction).

use super::{Grammar, Production, is_variable};
use crate::automaton::symbol::END_MARKER;
use crate::automaton::{Automaton, AutomatonKind, Label, StateId};
use crate::error::{Error, InvalidAutomaton, Result};
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};

/// `(p, X, q)`: the words that take the automaton from `p` with `X` on top
/// to `q` with `X` gone.
type Triple = (StateId, char, StateId);

struct Rule {
    head: Triple,
    read: String,
    body: Vec<Triple>,
}

fn not_normal(reason: impl Into<String>) -> Error {
    InvalidAutomaton::NotPdaNormalForm {
        reason: reason.into(),
    }
    .into()
}

/// Check the shape the construction needs: one final state, a one-symbol
/// initial stack, and moves that pop exactly one symbol and push none or two.
fn check_normal_form(pda: &Automaton) -> Result<(StateId, char, StateId)> {
    if pda.kind() != AutomatonKind::Pda {
        return Err(not_normal(format!("found a {} automaton", pda.kind())));
    }
    let initial = pda.require_initial()?;
    let final_state = match pda.finals().to_vec().as_slice() {
        [only] => *only,
        finals => {
            return Err(not_normal(format!(
                "needs exactly one final state, found {}",
                finals.len()
            )));
        }
    };
    let mut stack = pda.initial_stack().chars();
    let (Some(bottom), None) = (stack.next(), stack.next()) else {
        return Err(not_normal("initial stack must hold exactly one symbol"));
    };

    for transition in pda.transitions() {
        let Label::Pda { read, pop, push } = &transition.label else {
            continue;
        };
        if pop.chars().count() != 1 {
            return Err(not_normal(format!("{transition} must pop exactly one symbol")));
        }
        if !matches!(push.chars().count(), 0 | 2) {
            return Err(not_normal(format!("{transition} must push zero or two symbols")));
        }
        if read.chars().any(|c| is_variable(c) || c == END_MARKER) {
            return Err(Error::MalformedProduction {
                production: transition.to_string(),
                reason: "label uses a symbol reserved for grammars".to_string(),
            });
        }
    }
    Ok((initial, bottom, final_state))
}

fn rules(pda: &Automaton) -> Vec<Rule> {
    let states: Vec<StateId> = pda.state_ids().collect();
    let mut rules = Vec::new();
    for transition in pda.transitions() {
        let Label::Pda { read, pop, push } = &transition.label else {
            continue;
        };
        let Some(top) = pop.chars().next() else {
            continue;
        };
        let (p, q) = (transition.from, transition.to);
        let mut pushed = push.chars();
        match (pushed.next(), pushed.next()) {
            (Some(upper), Some(lower)) => {
                for &k in &states {
                    for &l in &states {
                        rules.push(Rule {
                            head: (p, top, k),
                            read: read.clone(),
                            body: vec![(q, upper, l), (l, lower, k)],
                        });
                    }
                }
            }
            _ => rules.push(Rule {
                head: (p, top, q),
                read: read.clone(),
                body: Vec::new(),
            }),
        }
    }
    rules
}

/// Triples that derive at least one word.
fn generating(rules: &[Rule]) -> HashSet<Triple> {
    let mut generating = HashSet::new();
    loop {
        let before = generating.len();
        for rule in rules {
            if rule.body.iter().all(|t| generating.contains(t)) {
                generating.insert(rule.head);
            }
        }
        if generating.len() == before {
            return generating;
        }
    }
}

/// Read a grammar off a pushdown automaton that accepts by final state and
/// empty stack together.
///
/// Each variable stands for a triple `(p, X, q)`. A move from `p` to `q`
/// reading `a` and popping `X` gives `(p X q) → a` when it pushes nothing,
/// and `(p X k) → a (q Y l)(l Z k)` for every pair of states `k`, `l` when
/// it pushes `YZ`. The start variable `S` is `(initial, bottom, final)`.
/// Triples that derive nothing or cannot be reached from `S` are purged
/// before the rest are named `A`, `B`, ... in order of first use.
pub fn pda_to_grammar(pda: &Automaton) -> Result<Grammar> {
    let (initial, bottom, final_state) = check_normal_form(pda)?;
    let rules = rules(pda);
    let generating = generating(&rules);
    let useful = |rule: &Rule| rule.body.iter().all(|t| generating.contains(t));

    let start: Triple = (initial, bottom, final_state);
    let mut reachable = BTreeSet::from([start]);
    let mut pending = vec![start];
    while let Some(triple) = pending.pop() {
        for rule in rules.iter().filter(|r| r.head == triple && useful(r)) {
            for &t in &rule.body {
                if reachable.insert(t) {
                    pending.push(t);
                }
            }
        }
    }

    let mut letters = ('A'..='Z').filter(|&c| c != 'S');
    let mut names: HashMap<Triple, char> = HashMap::from([(start, 'S')]);
    let mut grammar = Grammar::new('S')?;
    for rule in rules
        .iter()
        .filter(|r| reachable.contains(&r.head) && generating.contains(&r.head) && useful(r))
    {
        let mut name_of = |triple: Triple| -> Result<char> {
            if let Some(&name) = names.get(&triple) {
                return Ok(name);
            }
            let name = letters.next().ok_or(Error::NoFreeVariable)?;
            names.insert(triple, name);
            Ok(name)
        };
        let lhs = name_of(rule.head)?;
        let mut rhs = rule.read.clone();
        for &triple in &rule.body {
            rhs.push(name_of(triple)?);
        }
        grammar.add_production(Production::new(lhs, rhs)?);
    }

    debug!(
        "PDA with {} transitions -> {} candidate rules -> {} productions over {} variables",
        pda.transitions().len(),
        rules.len(),
        grammar.productions().len(),
        names.len()
    );
    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Transition;
    use crate::config::{AcceptanceMode, SearchConfig};
    use crate::grammar::grammar_to_pda;
    use crate::sim::Simulator;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// aⁿbⁿ, accepted in `q2` with the stack emptied.
    fn anbn() -> Automaton {
        let mut pda = Automaton::pda();
        let q0 = pda.add_state();
        let q1 = pda.add_state();
        let q2 = pda.add_state();
        pda.set_initial(q0).unwrap();
        pda.add_final(q2).unwrap();
        pda.set_initial_stack("Z").unwrap();
        for transition in [
            Transition::pda(q0, q0, "a", "Z", "AZ"),
            Transition::pda(q0, q0, "a", "A", "AA"),
            Transition::pda(q0, q1, "b", "A", ""),
            Transition::pda(q1, q1, "b", "A", ""),
            Transition::pda(q1, q2, "", "Z", ""),
            Transition::pda(q0, q2, "", "Z", ""),
        ] {
            pda.add_transition(transition).unwrap();
        }
        pda
    }

    fn words_up_to(length: usize) -> Vec<String> {
        let mut words = vec![String::new()];
        let mut last = vec![String::new()];
        for _ in 0..length {
            last = last
                .iter()
                .flat_map(|w| ['a', 'b'].map(|c| format!("{w}{c}")))
                .collect();
            words.extend(last.iter().cloned());
        }
        words
    }

    #[test]
    fn test_anbn_productions() {
        init();
        let grammar = pda_to_grammar(&anbn()).unwrap();
        let rendered: Vec<String> = grammar.productions().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["S → aAB", "A → aAC", "A → b", "C → b", "B → λ", "S → λ"]
        );
    }

    #[test]
    fn test_grammar_language_matches_pda() {
        init();
        let pda = anbn();
        let original = Simulator::new(
            &pda,
            SearchConfig::default().with_acceptance(AcceptanceMode::FinalStateAndEmptyStack),
        )
        .unwrap();
        let rebuilt = grammar_to_pda(&pda_to_grammar(&pda).unwrap()).unwrap();
        let rebuilt = Simulator::new(&rebuilt, SearchConfig::default()).unwrap();

        for word in words_up_to(6) {
            assert_eq!(
                original.run(&word).unwrap(),
                rebuilt.run(&word).unwrap(),
                "word {word:?}"
            );
        }
        assert!(rebuilt.run("aaabbb").unwrap());
    }

    #[test]
    fn test_empty_language_has_no_productions() {
        let mut pda = Automaton::pda();
        let q0 = pda.add_state();
        let q1 = pda.add_state();
        pda.set_initial(q0).unwrap();
        pda.add_final(q1).unwrap();
        pda.set_initial_stack("Z").unwrap();
        // pushes forever, never empties the stack
        pda.add_transition(Transition::pda(q0, q0, "a", "Z", "ZZ")).unwrap();

        let grammar = pda_to_grammar(&pda).unwrap();
        assert!(grammar.productions().is_empty());
    }

    #[test]
    fn test_rejects_other_shapes() {
        let ll = grammar_to_pda(&Grammar::parse("S -> aSb | λ").unwrap()).unwrap();
        assert!(matches!(
            pda_to_grammar(&ll),
            Err(Error::InvalidAutomaton(InvalidAutomaton::NotPdaNormalForm { .. }))
        ));

        let mut no_bottom = anbn();
        no_bottom.set_initial_stack("").unwrap();
        assert!(pda_to_grammar(&no_bottom).is_err());

        let mut two_finals = anbn();
        two_finals.add_final(0).unwrap();
        assert!(pda_to_grammar(&two_finals).is_err());

        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        fsa.set_initial(q0).unwrap();
        fsa.add_final(q0).unwrap();
        assert!(pda_to_grammar(&fsa).is_err());
    }

    #[test]
    fn test_reserved_read_label() {
        let mut pda = anbn();
        pda.add_transition(Transition::pda(0, 2, "X", "Z", "")).unwrap();
        assert!(matches!(
            pda_to_grammar(&pda),
            Err(Error::MalformedProduction { .. })
        ));
    }
}
