//! LR(0) item sets and SLR(1) parse tables.
//!
//! The construction is exposed as a small state machine ([`LrStep`]) so a
//! caller can show the augmented grammar, the canonical item sets, the goto
//! graph and the finished table one after another. [`lr_table`] runs it to
//! completion.

use super::first_follow::FirstFollow;
use super::{Grammar, Production, is_variable};
use crate::automaton::symbol::END_MARKER;
use crate::automaton::{Automaton, Transition};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

/// A production of the augmented grammar with a dot before symbol `dot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: usize,
    pub dot: usize,
}

impl Item {
    pub fn new(production: usize, dot: usize) -> Self {
        Self { production, dot }
    }

    pub fn advance(self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }
}

/// Ordered, so two item sets with the same members compare and hash equal
/// however they were reached.
pub type ItemSet = BTreeSet<Item>;

/// The grammar plus a fresh start variable `S'` with the single production
/// `S' → S` at index 0. Production `i` of the original grammar sits at
/// index `i + 1`.
#[derive(Debug, Clone)]
pub struct AugmentedGrammar {
    grammar: Grammar,
    start: char,
    productions: Vec<Production>,
}

impl AugmentedGrammar {
    pub fn new(grammar: &Grammar) -> Result<Self> {
        let start = grammar.fresh_variable()?;
        let mut productions = vec![Production::new(start, grammar.start().to_string())?];
        productions.extend(grammar.productions().iter().cloned());
        Ok(Self {
            grammar: grammar.clone(),
            start,
            productions,
        })
    }

    /// The original grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The added start variable.
    pub fn start(&self) -> char {
        self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Index in the original grammar, or `None` for `S' → S`.
    pub fn original_index(&self, production: usize) -> Option<usize> {
        production.checked_sub(1)
    }

    pub fn symbol_after_dot(&self, item: Item) -> Option<char> {
        self.productions.get(item.production)?.symbol(item.dot)
    }

    pub fn is_complete(&self, item: Item) -> bool {
        self.productions
            .get(item.production)
            .is_none_or(|p| item.dot >= p.len())
    }

    /// Add `B → ·γ` for every item with a variable `B` after its dot, until
    /// nothing changes.
    pub fn closure(&self, items: &ItemSet) -> ItemSet {
        let mut closed = items.clone();
        let mut work: Vec<Item> = items.iter().copied().collect();
        while let Some(item) = work.pop() {
            let Some(next) = self.symbol_after_dot(item).filter(|&c| is_variable(c)) else {
                continue;
            };
            for (index, production) in self.productions.iter().enumerate() {
                if production.lhs() == next {
                    let added = Item::new(index, 0);
                    if closed.insert(added) {
                        work.push(added);
                    }
                }
            }
        }
        closed
    }

    /// Closure of the items of `items` with their dot moved past `symbol`.
    /// Empty if no item has `symbol` after its dot.
    pub fn goto(&self, items: &ItemSet, symbol: char) -> ItemSet {
        let kernel: ItemSet = items
            .iter()
            .filter(|&&item| self.symbol_after_dot(item) == Some(symbol))
            .map(|item| item.advance())
            .collect();
        if kernel.is_empty() {
            return kernel;
        }
        self.closure(&kernel)
    }

    /// Closure of `{S' → ·S}`.
    pub fn initial_items(&self) -> ItemSet {
        self.closure(&BTreeSet::from([Item::new(0, 0)]))
    }

    /// `E → E·+T` style rendering.
    pub fn item_string(&self, item: Item) -> String {
        let Some(production) = self.productions.get(item.production) else {
            return String::new();
        };
        let (before, after): (String, String) = {
            let rhs: Vec<char> = production.rhs().chars().collect();
            let dot = item.dot.min(rhs.len());
            (rhs[..dot].iter().collect(), rhs[dot..].iter().collect())
        };
        format!("{} → {before}·{after}", production.lhs())
    }

    fn symbols_after_dots(&self, items: &ItemSet) -> BTreeSet<char> {
        items
            .iter()
            .filter_map(|&item| self.symbol_after_dot(item))
            .collect()
    }
}

/// Entry of the action part of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Shift(usize),
    /// Reduce by this production of the original grammar.
    Reduce(usize),
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift(state) => write!(f, "s{state}"),
            Action::Reduce(production) => write!(f, "r{production}"),
            Action::Accept => f.write_str("acc"),
        }
    }
}

/// SLR(1) action and goto tables. Action cells keep every action that
/// claimed them, so conflicts can be displayed.
#[derive(Debug, Clone)]
pub struct LrTable {
    grammar: AugmentedGrammar,
    num_states: usize,
    actions: BTreeMap<(usize, char), Vec<Action>>,
    gotos: BTreeMap<(usize, char), usize>,
}

impl LrTable {
    fn new(grammar: AugmentedGrammar, num_states: usize) -> Self {
        Self {
            grammar,
            num_states,
            actions: BTreeMap::new(),
            gotos: BTreeMap::new(),
        }
    }

    fn add_action(&mut self, state: usize, symbol: char, action: Action) {
        let cell = self.actions.entry((state, symbol)).or_default();
        if !cell.contains(&action) {
            trace!("ACTION[{state}, {symbol}] += {action}");
            cell.push(action);
        }
    }

    pub fn grammar(&self) -> &AugmentedGrammar {
        &self.grammar
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Every action in the cell, in the order they were added.
    pub fn actions(&self, state: usize, symbol: char) -> &[Action] {
        self.actions
            .get(&(state, symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The action in the cell if there is exactly one.
    pub fn action(&self, state: usize, symbol: char) -> Option<Action> {
        match self.actions(state, symbol) {
            [action] => Some(*action),
            _ => None,
        }
    }

    pub fn goto(&self, state: usize, variable: char) -> Option<usize> {
        self.gotos.get(&(state, variable)).copied()
    }

    /// Non-empty action cells in state then symbol order.
    pub fn action_cells(&self) -> impl Iterator<Item = (usize, char, &[Action])> + '_ {
        self.actions
            .iter()
            .map(|(&(state, symbol), cell)| (state, symbol, cell.as_slice()))
    }

    pub fn goto_cells(&self) -> impl Iterator<Item = (usize, char, usize)> + '_ {
        self.gotos
            .iter()
            .map(|(&(state, variable), &to)| (state, variable, to))
    }

    /// Cells with more than one action.
    pub fn conflicts(&self) -> Vec<(usize, char)> {
        self.actions
            .iter()
            .filter(|(_, cell)| cell.len() > 1)
            .map(|(&key, _)| key)
            .collect()
    }

    fn first_conflict(&self) -> Option<Error> {
        let (&(state, symbol), cell) = self.actions.iter().find(|(_, cell)| cell.len() > 1)?;
        Some(Error::GrammarConflict {
            row: state.to_string(),
            symbol,
            existing: cell[0].to_string(),
            incoming: cell[1].to_string(),
        })
    }

    /// Shift-reduce parse of `input`. A conflicting cell counts as empty.
    pub fn accepts(&self, input: &str) -> bool {
        let productions = self.grammar.grammar().productions();
        let mut states = vec![0usize];
        let mut rest = input.chars().chain(std::iter::once(END_MARKER)).peekable();
        loop {
            let (Some(&state), Some(&lookahead)) = (states.last(), rest.peek()) else {
                return false;
            };
            match self.action(state, lookahead) {
                Some(Action::Shift(next)) => {
                    states.push(next);
                    rest.next();
                }
                Some(Action::Reduce(index)) => {
                    let Some(production) = productions.get(index) else {
                        return false;
                    };
                    if production.len() >= states.len() {
                        return false;
                    }
                    states.truncate(states.len() - production.len());
                    let Some(next) = states
                        .last()
                        .and_then(|&top| self.goto(top, production.lhs()))
                    else {
                        return false;
                    };
                    states.push(next);
                }
                Some(Action::Accept) => return true,
                None => return false,
            }
        }
    }
}

/// Stages of the table construction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LrStep {
    AugmentGrammar,
    BuildItemSets,
    BuildGotoGraph,
    FillTable,
    Done,
}

#[derive(Debug, Clone)]
pub struct LrConstruction {
    step: LrStep,
    augmented: AugmentedGrammar,
    item_sets: Vec<ItemSet>,
    index: HashMap<ItemSet, usize>,
    edges: BTreeMap<(usize, char), usize>,
    table: Option<LrTable>,
}

impl LrConstruction {
    /// Fails with `NoFreeVariable` if the grammar uses all 26 capitals.
    pub fn new(grammar: &Grammar) -> Result<Self> {
        Ok(Self {
            step: LrStep::AugmentGrammar,
            augmented: AugmentedGrammar::new(grammar)?,
            item_sets: Vec::new(),
            index: HashMap::new(),
            edges: BTreeMap::new(),
            table: None,
        })
    }

    /// The step `advance` will perform next.
    pub fn step(&self) -> LrStep {
        self.step
    }

    /// Perform the current step and return the one after it.
    pub fn advance(&mut self) -> LrStep {
        self.step = match self.step {
            LrStep::AugmentGrammar => LrStep::BuildItemSets,
            LrStep::BuildItemSets => {
                self.build_item_sets();
                LrStep::BuildGotoGraph
            }
            LrStep::BuildGotoGraph => {
                self.build_goto_graph();
                LrStep::FillTable
            }
            LrStep::FillTable => {
                self.table = Some(self.fill_table());
                LrStep::Done
            }
            LrStep::Done => LrStep::Done,
        };
        self.step
    }

    /// Run the remaining steps and hand back the table.
    pub fn run(mut self) -> LrTable {
        while self.step != LrStep::Done {
            self.advance();
        }
        match self.table {
            Some(table) => table,
            None => self.fill_table(),
        }
    }

    fn build_item_sets(&mut self) {
        let initial = self.augmented.initial_items();
        self.index.insert(initial.clone(), 0);
        self.item_sets.push(initial);

        let mut queue = VecDeque::from([0]);
        while let Some(state) = queue.pop_front() {
            for symbol in self.augmented.symbols_after_dots(&self.item_sets[state]) {
                let target = self.augmented.goto(&self.item_sets[state], symbol);
                if self.index.contains_key(&target) {
                    continue;
                }
                let id = self.item_sets.len();
                trace!("I{id} = goto(I{state}, {symbol}) with {} items", target.len());
                self.index.insert(target.clone(), id);
                self.item_sets.push(target);
                queue.push_back(id);
            }
        }
    }

    fn build_goto_graph(&mut self) {
        for (state, items) in self.item_sets.iter().enumerate() {
            for symbol in self.augmented.symbols_after_dots(items) {
                let target = self.augmented.goto(items, symbol);
                if let Some(&to) = self.index.get(&target) {
                    self.edges.insert((state, symbol), to);
                }
            }
        }
    }

    fn fill_table(&self) -> LrTable {
        let follow = FirstFollow::new(self.augmented.grammar());
        let mut table = LrTable::new(self.augmented.clone(), self.item_sets.len());
        for (state, items) in self.item_sets.iter().enumerate() {
            for (&(_, symbol), &to) in self.edges.range((state, char::MIN)..=(state, char::MAX)) {
                if is_variable(symbol) {
                    table.gotos.insert((state, symbol), to);
                } else {
                    table.add_action(state, symbol, Action::Shift(to));
                }
            }
            for &item in items.iter().filter(|&&item| self.augmented.is_complete(item)) {
                match self.augmented.original_index(item.production) {
                    None => table.add_action(state, END_MARKER, Action::Accept),
                    Some(index) => {
                        let lhs = self.augmented.productions()[item.production].lhs();
                        for &symbol in follow.follow(lhs) {
                            table.add_action(state, symbol, Action::Reduce(index));
                        }
                    }
                }
            }
        }
        table
    }

    pub fn augmented(&self) -> &AugmentedGrammar {
        &self.augmented
    }

    /// Canonical LR(0) item sets, numbered in discovery order.
    pub fn item_sets(&self) -> &[ItemSet] {
        &self.item_sets
    }

    /// `(state, symbol) → state` edges of the goto graph.
    pub fn goto_edges(&self) -> &BTreeMap<(usize, char), usize> {
        &self.edges
    }

    pub fn table(&self) -> Option<&LrTable> {
        self.table.as_ref()
    }

    /// Whether item set `state` holds a completed item.
    pub fn is_final(&self, state: usize) -> bool {
        self.item_sets
            .get(state)
            .is_some_and(|items| items.iter().any(|&item| self.augmented.is_complete(item)))
    }

    /// The goto graph as a finite state automaton: one state `I{n}` per
    /// item set, final where a reduction is possible.
    pub fn goto_automaton(&self) -> Result<Automaton> {
        let mut fsa = Automaton::fsa();
        let ids: Vec<_> = (0..self.item_sets.len())
            .map(|n| fsa.add_labeled_state(format!("I{n}")))
            .collect();
        if let Some(&initial) = ids.first() {
            fsa.set_initial(initial)?;
        }
        for (state, &id) in ids.iter().enumerate() {
            if self.is_final(state) {
                fsa.add_final(id)?;
            }
        }
        for (&(from, symbol), &to) in &self.edges {
            fsa.add_transition(Transition::fsa(ids[from], ids[to], symbol.to_string()))?;
        }
        Ok(fsa)
    }
}

/// Build the SLR(1) table for `grammar`, failing with `GrammarConflict` on
/// the first cell claimed by two actions.
pub fn lr_table(grammar: &Grammar) -> Result<LrTable> {
    let table = LrConstruction::new(grammar)?.run();
    if let Some(conflict) = table.first_conflict() {
        return Err(conflict);
    }
    debug!("SLR(1) table with {} states", table.num_states());
    Ok(table)
}
