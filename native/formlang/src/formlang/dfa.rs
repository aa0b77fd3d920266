//! Deterministic Finite Automaton (DFA) implementation with partition
//! refinement minimization.

use crate::automaton::symbol::{SymbolId, char_of};
use crate::automaton::{Automaton, StateId, StateSet, Transition};
use crate::error::Result;
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A Deterministic Finite Automaton over dense state indices.
#[derive(Debug, Clone)]
pub struct DFA {
    num_states: StateId,
    /// Start state (None if empty)
    start_state: Option<StateId>,
    final_states: StateSet,
    /// Transitions: (source, symbol) -> destination
    transitions: HashMap<(StateId, SymbolId), StateId>,
    /// All symbols used, in ascending order
    alphabet: BTreeSet<SymbolId>,
    /// Mapping from DFA states to original NFA states (if created via subset construction)
    state_mapping: Option<HashMap<StateId, Vec<StateId>>>,
}

/// Output of [`DFA::minimize`].
#[derive(Debug, Clone)]
pub struct MinimizedDFA {
    pub dfa: DFA,
    /// For each state of `dfa`, the reachable states of the input it merges.
    pub blocks: Vec<Vec<StateId>>,
    /// The partition after the initial split and after every refinement
    /// round, ending with the fixed point. Only input states appear; the
    /// virtual trap used for partial DFAs is left out.
    pub rounds: Vec<Vec<Vec<StateId>>>,
}

impl DFA {
    pub fn new() -> Self {
        Self {
            num_states: 0,
            start_state: None,
            final_states: StateSet::with_capacity(16),
            transitions: HashMap::new(),
            alphabet: BTreeSet::new(),
            state_mapping: None,
        }
    }

    /// Read an automaton that is already deterministic: one start state,
    /// single-symbol labels and at most one move per state and symbol.
    /// Returns `None` otherwise. Indices follow the automaton's state order.
    pub fn from_deterministic(automaton: &Automaton) -> Result<Option<(DFA, Vec<StateId>)>> {
        automaton.require_fsa()?;
        let initial = automaton.require_initial()?;

        let ids: Vec<StateId> = automaton.state_ids().collect();
        let index_of: HashMap<StateId, StateId> = ids
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index as StateId))
            .collect();

        let mut dfa = DFA::new();
        for _ in &ids {
            dfa.add_state();
        }
        dfa.set_start_state(index_of[&initial]);
        for final_state in automaton.finals().iter() {
            if let Some(&index) = index_of.get(&final_state) {
                dfa.add_final_state(index);
            }
        }

        for transition in automaton.transitions() {
            let mut chars = transition.label.read().unwrap_or_default().chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Ok(None);
            };
            let source = index_of[&transition.from];
            let symbol = c as SymbolId;
            if dfa.transition(source, symbol).is_some() {
                return Ok(None);
            }
            dfa.add_transition(source, symbol, index_of[&transition.to]);
        }

        Ok(Some((dfa, ids)))
    }

    /// Add a new state and return its ID.
    pub fn add_state(&mut self) -> StateId {
        let id = self.num_states;
        self.num_states += 1;
        id
    }

    pub fn set_start_state(&mut self, state: StateId) {
        self.start_state = Some(state);
    }

    pub fn add_final_state(&mut self, state: StateId) {
        self.final_states.insert(state);
    }

    /// Add a transition, replacing any previous move on the same symbol.
    pub fn add_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.alphabet.insert(symbol);
        self.transitions.insert((source, symbol), destination);
    }

    /// Get the transition from a state on a symbol.
    pub fn transition(&self, source: StateId, symbol: SymbolId) -> Option<StateId> {
        self.transitions.get(&(source, symbol)).copied()
    }

    pub fn num_states(&self) -> StateId {
        self.num_states
    }

    pub fn start_state(&self) -> Option<StateId> {
        self.start_state
    }

    pub fn final_states(&self) -> &StateSet {
        &self.final_states
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.final_states.contains(state)
    }

    pub fn alphabet(&self) -> &BTreeSet<SymbolId> {
        &self.alphabet
    }

    pub fn set_state_mapping(&mut self, mapping: HashMap<StateId, Vec<StateId>>) {
        self.state_mapping = Some(mapping);
    }

    pub fn state_mapping(&self) -> Option<&HashMap<StateId, Vec<StateId>>> {
        self.state_mapping.as_ref()
    }

    /// Get all transitions as an iterator.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.transitions
            .iter()
            .map(|(&(src, sym), &dst)| (src, sym, dst))
    }

    /// Minimize the DFA by Moore-style partition refinement.
    ///
    /// Unreachable states are dropped first. A partial DFA is refined as if
    /// every missing move went to a non-final trap state. Reachable dead
    /// states of the input land in the trap's block; that block becomes one
    /// dead state of the result, and is left out when the trap is its only
    /// member. The result never has more states than the reachable part of
    /// the input.
    pub fn minimize(&self) -> MinimizedDFA {
        let Some(start) = self.start_state else {
            return MinimizedDFA {
                dfa: DFA::new(),
                blocks: Vec::new(),
                rounds: Vec::new(),
            };
        };

        let reachable = self.find_reachable_states();
        let mut members: Vec<StateId> = reachable.to_vec();
        let trap = (!self.reachable_part_complete(&reachable)).then_some(self.num_states);
        members.extend(trap);

        // Initial partition: final states and non-final states
        let (finals, non_finals): (Vec<StateId>, Vec<StateId>) =
            members.iter().copied().partition(|&s| self.is_final(s));
        let mut partition: Vec<Vec<StateId>> = [finals, non_finals]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();

        let mut rounds = vec![Self::visible_partition(&partition, trap)];
        loop {
            let block_of = Self::block_index(&partition);
            let mut refined: Vec<Vec<StateId>> = Vec::with_capacity(partition.len());

            for block in &partition {
                // Group members by the blocks their moves land in
                let mut groups: Vec<(Vec<usize>, Vec<StateId>)> = Vec::new();
                for &state in block {
                    let signature = self.signature(state, trap, &block_of);
                    match groups.iter_mut().find(|(sig, _)| *sig == signature) {
                        Some((_, group)) => group.push(state),
                        None => groups.push((signature, vec![state])),
                    }
                }
                if groups.len() > 1 {
                    trace!("split block {block:?} into {} groups", groups.len());
                }
                refined.extend(groups.into_iter().map(|(_, group)| group));
            }

            let converged = refined.len() == partition.len();
            partition = refined;
            if converged {
                break;
            }
            rounds.push(Self::visible_partition(&partition, trap));
        }

        debug!(
            "minimized DFA from {} reachable states to {} blocks in {} rounds",
            reachable.len(),
            partition.len(),
            rounds.len()
        );
        self.build_minimized_dfa(start, &partition, trap, rounds)
    }

    /// Whether every reachable state has a move on every symbol.
    fn reachable_part_complete(&self, reachable: &StateSet) -> bool {
        reachable
            .iter()
            .all(|s| self.alphabet.iter().all(|&sym| self.transition(s, sym).is_some()))
    }

    fn block_index(partition: &[Vec<StateId>]) -> HashMap<StateId, usize> {
        partition
            .iter()
            .enumerate()
            .flat_map(|(index, block)| block.iter().map(move |&s| (s, index)))
            .collect()
    }

    /// Target block of `state` for every symbol in alphabet order.
    fn signature(
        &self,
        state: StateId,
        trap: Option<StateId>,
        block_of: &HashMap<StateId, usize>,
    ) -> Vec<usize> {
        self.alphabet
            .iter()
            .map(|&symbol| {
                let target = if Some(state) == trap {
                    trap
                } else {
                    self.transition(state, symbol).or(trap)
                };
                target.map_or(usize::MAX, |t| block_of[&t])
            })
            .collect()
    }

    fn visible_partition(partition: &[Vec<StateId>], trap: Option<StateId>) -> Vec<Vec<StateId>> {
        partition
            .iter()
            .map(|block| block.iter().copied().filter(|&s| Some(s) != trap).collect::<Vec<_>>())
            .filter(|block| !block.is_empty())
            .collect()
    }

    /// Find all states reachable from the start state.
    fn find_reachable_states(&self) -> StateSet {
        let mut reachable = StateSet::with_capacity(self.num_states as usize);

        let Some(start) = self.start_state else {
            return reachable;
        };

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(state) = queue.pop_front() {
            if !reachable.insert(state) {
                continue;
            }
            for &symbol in &self.alphabet {
                if let Some(next) = self.transition(state, symbol) {
                    if !reachable.contains(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        reachable
    }

    /// States from which some final state can be reached.
    pub fn live_states(&self) -> StateSet {
        let mut reverse: HashMap<StateId, Vec<StateId>> = HashMap::new();
        for (src, _, dst) in self.transitions() {
            reverse.entry(dst).or_default().push(src);
        }

        let mut live = StateSet::with_capacity(self.num_states as usize);
        let mut queue: VecDeque<StateId> = self.final_states.iter().collect();
        while let Some(state) = queue.pop_front() {
            if !live.insert(state) {
                continue;
            }
            if let Some(sources) = reverse.get(&state) {
                queue.extend(sources.iter().copied().filter(|s| !live.contains(*s)));
            }
        }
        live
    }

    /// Build a minimized DFA from partitions.
    fn build_minimized_dfa(
        &self,
        start: StateId,
        partitions: &[Vec<StateId>],
        trap: Option<StateId>,
        rounds: Vec<Vec<Vec<StateId>>>,
    ) -> MinimizedDFA {
        let block_of = Self::block_index(partitions);
        // Only a block holding nothing but the virtual trap is dropped
        let trap_only = trap
            .map(|t| block_of[&t])
            .filter(|&b| partitions[b].iter().all(|&s| Some(s) == trap));

        // Number the kept blocks; the start block comes first
        let start_block = block_of[&start];
        let mut order: Vec<usize> = vec![start_block];
        order.extend((0..partitions.len()).filter(|&b| b != start_block && Some(b) != trap_only));
        let new_id: HashMap<usize, StateId> = order
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as StateId))
            .collect();

        let mut minimized = DFA::new();
        for _ in &order {
            minimized.add_state();
        }
        minimized.set_start_state(0);

        let mut blocks = Vec::with_capacity(order.len());
        for &block in &order {
            let id = new_id[&block];
            let members: Vec<StateId> = partitions[block]
                .iter()
                .copied()
                .filter(|&s| Some(s) != trap)
                .collect();

            if let Some(&representative) = members.first() {
                if self.is_final(representative) {
                    minimized.add_final_state(id);
                }
                for &symbol in &self.alphabet {
                    let Some(dest) = self.transition(representative, symbol) else {
                        continue;
                    };
                    if let Some(&new_dest) = new_id.get(&block_of[&dest]) {
                        minimized.add_transition(id, symbol, new_dest);
                    }
                }
            }
            blocks.push(members);
        }
        // Keep the alphabet even if the trap swallowed every use of a symbol
        minimized.alphabet.extend(self.alphabet.iter().copied());

        // Build state mapping from minimized states to original NFA states
        if let Some(orig_mapping) = &self.state_mapping {
            let mut new_mapping: HashMap<StateId, Vec<StateId>> = HashMap::new();
            for (new_state, members) in blocks.iter().enumerate() {
                let mut nfa_states: Vec<StateId> = members
                    .iter()
                    .filter_map(|s| orig_mapping.get(s))
                    .flatten()
                    .copied()
                    .collect();
                nfa_states.sort_unstable();
                nfa_states.dedup();
                new_mapping.insert(new_state as StateId, nfa_states);
            }
            minimized.state_mapping = Some(new_mapping);
        }

        MinimizedDFA {
            dfa: minimized,
            blocks,
            rounds,
        }
    }

    /// Express the DFA as an [`Automaton`], naming each state with `name`.
    /// States are created in index order, so state `i` of the DFA is the
    /// `i`-th state of the result.
    pub fn to_automaton(
        &self,
        mut name: impl FnMut(StateId) -> Option<String>,
    ) -> Result<Automaton> {
        let mut automaton = Automaton::fsa();
        let mut ids = Vec::with_capacity(self.num_states as usize);
        for state in 0..self.num_states {
            let id = automaton.add_state();
            automaton.set_label(id, name(state))?;
            ids.push(id);
        }
        if let Some(start) = self.start_state {
            automaton.set_initial(ids[start as usize])?;
        }
        for state in self.final_states.iter() {
            automaton.add_final(ids[state as usize])?;
        }

        let mut transitions: Vec<(StateId, SymbolId, StateId)> = self.transitions().collect();
        transitions.sort_unstable();
        for (src, symbol, dst) in transitions {
            let read = char_of(symbol).map(String::from).unwrap_or_default();
            automaton.add_transition(Transition::fsa(ids[src as usize], ids[dst as usize], read))?;
        }
        Ok(automaton)
    }
}

impl Default for DFA {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    fn sym(c: char) -> SymbolId {
        c as SymbolId
    }

    /// Walk the DFA over `input`.
    pub(in crate::formlang) fn accepts(dfa: &DFA, input: &str) -> bool {
        let Some(mut state) = dfa.start_state() else {
            return false;
        };
        for c in input.chars() {
            match dfa.transition(state, sym(c)) {
                Some(next) => state = next,
                None => return false,
            }
        }
        dfa.is_final(state)
    }

    fn is_complete(dfa: &DFA) -> bool {
        (0..dfa.num_states())
            .all(|s| dfa.alphabet().iter().all(|&c| dfa.transition(s, c).is_some()))
    }

    fn is_empty(dfa: &DFA) -> bool {
        dfa.start_state()
            .is_none_or(|start| !dfa.live_states().contains(start))
    }

    #[test]
    fn test_dfa_basic() {
        let mut dfa = DFA::new();
        let s0 = dfa.add_state();
        let s1 = dfa.add_state();
        let s2 = dfa.add_state();

        dfa.set_start_state(s0);
        dfa.add_final_state(s2);
        dfa.add_transition(s0, sym('a'), s1);
        dfa.add_transition(s1, sym('b'), s2);

        assert_eq!(dfa.num_states(), 3);
        assert_eq!(dfa.start_state(), Some(0));
        assert!(!is_empty(&dfa));
        assert!(!is_complete(&dfa));
        assert!(accepts(&dfa, "ab"));
        assert!(!accepts(&dfa, "a"));
        assert!(!accepts(&dfa, "abb"));
    }

    #[test]
    fn test_dfa_minimization_merges_equivalent_states() {
        // 0 -a-> 1 -b-> 3(final)
        // 0 -b-> 2 -b-> 4(final)
        // 1 and 2 merge, as do 3 and 4
        let mut dfa = DFA::new();
        for _ in 0..5 {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        dfa.add_final_state(3);
        dfa.add_final_state(4);
        dfa.add_transition(0, sym('a'), 1);
        dfa.add_transition(0, sym('b'), 2);
        dfa.add_transition(1, sym('b'), 3);
        dfa.add_transition(2, sym('b'), 4);

        let minimized = dfa.minimize();
        assert_eq!(minimized.dfa.num_states(), 3);
        assert!(minimized.blocks.contains(&vec![1, 2]));
        assert!(minimized.blocks.contains(&vec![3, 4]));
        assert!(accepts(&minimized.dfa, "ab"));
        assert!(accepts(&minimized.dfa, "bb"));
        assert!(!accepts(&minimized.dfa, "b"));
        // the trap splits away from the start state one round after 1 and 2 split off
        assert_eq!(minimized.rounds.first().map(Vec::len), Some(2));
        assert_eq!(minimized.rounds.last().map(Vec::len), Some(3));
    }

    #[test]
    fn test_minimization_drops_unreachable_states() {
        let mut dfa = DFA::new();
        for _ in 0..3 {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        dfa.add_final_state(0);
        dfa.add_final_state(2);
        dfa.add_transition(0, sym('a'), 0);
        dfa.add_transition(2, sym('a'), 1);

        let minimized = dfa.minimize();
        assert_eq!(minimized.dfa.num_states(), 1);
        assert_eq!(minimized.blocks, vec![vec![0]]);
    }

    #[test]
    fn test_minimization_keeps_complete_dead_state() {
        // complete DFA for "a": 0 -a-> 1, everything else -> 2 (dead)
        let mut dfa = DFA::new();
        for _ in 0..3 {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        dfa.add_final_state(1);
        dfa.add_transition(0, sym('a'), 1);
        dfa.add_transition(1, sym('a'), 2);
        dfa.add_transition(2, sym('a'), 2);

        let minimized = dfa.minimize();
        assert_eq!(minimized.dfa.num_states(), 3);
        assert!(is_complete(&minimized.dfa));

        let again = minimized.dfa.minimize();
        assert_eq!(again.dfa.num_states(), 3);
    }

    #[test]
    fn test_minimization_of_partial_dfa_is_idempotent() {
        // a*b with a partial transition function
        let mut dfa = DFA::new();
        for _ in 0..2 {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        dfa.add_final_state(1);
        dfa.add_transition(0, sym('a'), 0);
        dfa.add_transition(0, sym('b'), 1);

        let once = dfa.minimize();
        assert_eq!(once.dfa.num_states(), 2);
        let twice = once.dfa.minimize();
        assert_eq!(twice.dfa.num_states(), 2);
        assert!(accepts(&twice.dfa, "aab"));
        assert!(!accepts(&twice.dfa, "aba"));
    }

    #[test]
    fn test_minimize_empty_language() {
        let mut dfa = DFA::new();
        dfa.add_state();
        dfa.add_state();
        dfa.set_start_state(0);
        dfa.add_transition(0, sym('a'), 1);

        let minimized = dfa.minimize();
        assert_eq!(minimized.dfa.num_states(), 1);
        assert!(is_empty(&minimized.dfa));
        // every reachable state is dead, so both fold into one kept block
        assert_eq!(minimized.blocks, vec![vec![0, 1]]);
        assert_eq!(minimized.dfa.transition(0, sym('a')), Some(0));
    }

    #[test]
    fn test_explicit_dead_state_stays_visible() {
        // 0 -a-> 1(final), 0 -b-> 2, 2 -b-> 2; 2 is dead and 1 has no moves
        let mut dfa = DFA::new();
        for _ in 0..3 {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        dfa.add_final_state(1);
        dfa.add_transition(0, sym('a'), 1);
        dfa.add_transition(0, sym('b'), 2);
        dfa.add_transition(2, sym('b'), 2);

        let minimized = dfa.minimize();
        assert_eq!(minimized.dfa.num_states(), 3);
        assert_eq!(minimized.blocks, vec![vec![0], vec![1], vec![2]]);
        assert!(minimized.rounds.iter().all(|round| round.concat().contains(&2)));
        assert!(accepts(&minimized.dfa, "a"));
        assert!(!accepts(&minimized.dfa, "bb"));

        let again = minimized.dfa.minimize();
        assert_eq!(again.dfa.num_states(), 3);
    }

    #[test]
    fn test_empty_dfa() {
        let dfa = DFA::new();
        assert!(is_empty(&dfa));
        assert_eq!(dfa.minimize().dfa.num_states(), 0);

        let mut dfa2 = DFA::new();
        dfa2.add_state();
        dfa2.set_start_state(0);
        assert!(is_empty(&dfa2));
    }

    #[test]
    fn test_live_states() {
        let mut dfa = DFA::new();
        for _ in 0..3 {
            dfa.add_state();
        }
        dfa.set_start_state(0);
        dfa.add_final_state(1);
        dfa.add_transition(0, sym('a'), 1);
        dfa.add_transition(0, sym('b'), 2);
        dfa.add_transition(2, sym('b'), 2);

        assert_eq!(dfa.live_states().to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_round_trip_through_automaton() {
        let mut dfa = DFA::new();
        dfa.add_state();
        dfa.add_state();
        dfa.set_start_state(0);
        dfa.add_final_state(1);
        dfa.add_transition(0, sym('x'), 1);

        let automaton = dfa.to_automaton(|s| Some(format!("m{s}"))).unwrap();
        assert_eq!(automaton.num_states(), 2);
        assert_eq!(automaton.state_name(0), "m0");

        let (back, ids) = DFA::from_deterministic(&automaton).unwrap().unwrap();
        assert_eq!(ids, vec![0, 1]);
        assert!(accepts(&back, "x"));
    }

    #[test]
    fn test_from_deterministic_rejects_nfa() {
        let mut fsa = Automaton::fsa();
        let q0 = fsa.add_state();
        let q1 = fsa.add_state();
        fsa.set_initial(q0).unwrap();
        fsa.add_transition(Transition::fsa(q0, q0, "a")).unwrap();
        fsa.add_transition(Transition::fsa(q0, q1, "a")).unwrap();
        assert!(DFA::from_deterministic(&fsa).unwrap().is_none());

        let mut long = Automaton::fsa();
        let p0 = long.add_state();
        long.set_initial(p0).unwrap();
        long.add_transition(Transition::fsa(p0, p0, "ab")).unwrap();
        assert!(DFA::from_deterministic(&long).unwrap().is_none());
    }
}
