//! Sample words from the language of an automaton or a grammar.
//!
//! Generation is exhaustive rather than random: configurations (or
//! sentential forms) are explored in buckets keyed by the length of the
//! shortest word they can still lead to, so words come out shortest first.
//! The same safety bound that limits a simulation limits the exploration.

use crate::automaton::{Automaton, AutomatonKind, Label, StateId};
use crate::config::SearchConfig;
use crate::error::{InvalidAutomaton, Result};
use crate::grammar::{Grammar, is_variable};
use crate::sim::{Configuration, Simulator, Stack};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Words produced by [`automaton_words`] or [`grammar_words`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Words {
    pub requested: usize,
    /// Shortest first, then in lexicographic order.
    pub words: Vec<String>,
    /// False if the bound ran out before the search could tell that `words`
    /// holds the shortest words of the language.
    pub complete: bool,
}

impl Words {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            words: Vec::new(),
            complete: true,
        }
    }

    /// Append the words of one length. Returns true once enough are held.
    fn absorb(&mut self, found: BTreeSet<String>) -> bool {
        let room = self.requested.saturating_sub(self.words.len());
        self.words.extend(found.into_iter().take(room));
        self.words.len() >= self.requested
    }

    fn give_up(mut self, found: BTreeSet<String>) -> Self {
        self.absorb(found);
        self.complete = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Node {
    state: StateId,
    stack: Stack,
    word: String,
}

/// Up to `count` words of at most `max_length` symbols accepted by a finite
/// state or pushdown automaton. Pushdown acceptance follows
/// `config.acceptance`, and `config.bound` caps the configurations generated.
pub fn automaton_words(
    automaton: &Automaton,
    count: usize,
    max_length: usize,
    config: &SearchConfig,
) -> Result<Words> {
    let kind = automaton.kind();
    if kind == AutomatonKind::Turing {
        return Err(InvalidAutomaton::Unsupported {
            operation: "word generation",
            found: kind,
        }
        .into());
    }
    let sim = Simulator::new(automaton, config.clone())?;
    let mut words = Words::new(count);
    let Some(root) = sim.initial_configurations("").into_iter().next() else {
        return Ok(words);
    };
    if count == 0 {
        return Ok(words);
    }

    let start = Node {
        state: root.state(),
        stack: root.stack().cloned().unwrap_or_default(),
        word: String::new(),
    };
    let mut buckets: Vec<VecDeque<Node>> = vec![VecDeque::new(); max_length + 1];
    let mut seen = HashSet::from([start.clone()]);
    buckets[0].push_back(start);
    let mut generated = 1;

    for length in 0..=max_length {
        let mut found = BTreeSet::new();
        while let Some(node) = buckets[length].pop_front() {
            let here = match kind {
                AutomatonKind::Pda => Configuration::pda(node.state, "", node.stack.clone()),
                _ => Configuration::fsa(node.state, ""),
            };
            if sim.is_accepting(&here) {
                found.insert(node.word.clone());
            }

            for transition in automaton.transitions_from(node.state) {
                let (read, stack) = match &transition.label {
                    Label::Fsa { read } => (read, node.stack.clone()),
                    Label::Pda { read, pop, push } => {
                        if !node.stack.peek_matches(pop) {
                            continue;
                        }
                        let mut stack = node.stack.clone();
                        stack.pop(pop.chars().count());
                        stack.push(push);
                        (read, stack)
                    }
                    Label::Turing { .. } => continue,
                };
                let next_length = length + read.chars().count();
                if next_length > max_length {
                    continue;
                }
                let child = Node {
                    state: transition.to,
                    stack,
                    word: format!("{}{read}", node.word),
                };
                if !seen.insert(child.clone()) {
                    continue;
                }
                generated += 1;
                if generated > config.bound {
                    debug!("stopped at length {length} after {generated} configurations");
                    return Ok(words.give_up(found));
                }
                buckets[next_length].push_back(child);
            }
        }
        if words.absorb(found) {
            break;
        }
    }
    debug!(
        "generated {} of {count} words with {generated} configurations",
        words.words.len()
    );
    Ok(words)
}

/// Length of the shortest terminal string each variable derives. Variables
/// that derive nothing are absent.
fn shortest_yields(grammar: &Grammar) -> HashMap<char, usize> {
    let mut yields: HashMap<char, usize> = HashMap::new();
    loop {
        let mut changed = false;
        for production in grammar.productions() {
            let Some(cost) = lower_bound(production.rhs(), &yields) else {
                continue;
            };
            let best = yields.entry(production.lhs()).or_insert(usize::MAX);
            if cost < *best {
                *best = cost;
                changed = true;
            }
        }
        if !changed {
            return yields;
        }
    }
}

fn lower_bound(form: &str, yields: &HashMap<char, usize>) -> Option<usize> {
    form.chars()
        .map(|c| if is_variable(c) { yields.get(&c).copied() } else { Some(1) })
        .sum()
}

/// Up to `count` words of at most `max_length` symbols derivable from
/// `grammar`, by breadth-first leftmost derivation. At most `bound`
/// sentential forms are generated.
pub fn grammar_words(grammar: &Grammar, count: usize, max_length: usize, bound: usize) -> Words {
    let mut words = Words::new(count);
    let yields = shortest_yields(grammar);
    let start = grammar.start().to_string();
    let Some(first) = lower_bound(&start, &yields).filter(|&b| b <= max_length) else {
        return words;
    };
    if count == 0 {
        return words;
    }

    let mut buckets: Vec<VecDeque<String>> = vec![VecDeque::new(); max_length + 1];
    let mut seen = HashSet::from([start.clone()]);
    buckets[first].push_back(start);
    let mut generated = 1;

    for length in 0..=max_length {
        let mut found = BTreeSet::new();
        while let Some(form) = buckets[length].pop_front() {
            let Some((at, variable)) = form.char_indices().find(|&(_, c)| is_variable(c)) else {
                found.insert(form);
                continue;
            };
            let (before, after) = (&form[..at], &form[at + variable.len_utf8()..]);
            for production in grammar.productions_for(variable) {
                let child = format!("{before}{}{after}", production.rhs());
                let Some(child_bound) = lower_bound(&child, &yields) else {
                    continue;
                };
                if child_bound > max_length || !seen.insert(child.clone()) {
                    continue;
                }
                generated += 1;
                if generated > bound {
                    debug!("derivation stopped at length {length} after {generated} forms");
                    return words.give_up(found);
                }
                buckets[child_bound].push_back(child);
            }
        }
        if words.absorb(found) {
            break;
        }
    }
    words
}
