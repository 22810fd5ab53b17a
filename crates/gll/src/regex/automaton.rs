use super::pattern::Pattern;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// State ID in the DFA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub u32);

type CharRange = std::ops::RangeInclusive<char>;

/// NFA state for construction
#[derive(Debug, Clone, Default)]
struct NfaState {
    transitions: Vec<(CharRange, u32)>,
    epsilon_transitions: Vec<u32>,
}

/// Thompson NFA with a single accepting state.
#[derive(Debug)]
struct Nfa {
    states: Vec<NfaState>,
    start: u32,
    accept: u32,
}

impl Nfa {
    fn from_pattern(pattern: &Pattern) -> Self {
        let mut nfa = Self {
            states: vec![NfaState::default(), NfaState::default()],
            start: 0,
            accept: 1,
        };
        nfa.build(pattern, nfa.start, nfa.accept);
        nfa
    }

    fn add_state(&mut self) -> u32 {
        let id = u32::try_from(self.states.len()).unwrap_or(u32::MAX);
        self.states.push(NfaState::default());
        id
    }

    fn add_epsilon(&mut self, from: u32, to: u32) {
        self.states[from as usize].epsilon_transitions.push(to);
    }

    fn add_range(&mut self, from: u32, range: CharRange, to: u32) {
        self.states[from as usize].transitions.push((range, to));
    }

    fn build(&mut self, pattern: &Pattern, start: u32, end: u32) {
        match pattern {
            Pattern::Epsilon => self.add_epsilon(start, end),
            Pattern::Char(c) => self.add_range(start, *c..=*c, end),
            Pattern::Class(set) => {
                for &(lo, hi) in set.ranges() {
                    self.add_range(start, lo..=hi, end);
                }
            }
            Pattern::Seq(items) => {
                if items.is_empty() {
                    self.add_epsilon(start, end);
                    return;
                }
                let mut current = start;
                for (i, item) in items.iter().enumerate() {
                    let next = if i + 1 == items.len() {
                        end
                    } else {
                        self.add_state()
                    };
                    self.build(item, current, next);
                    current = next;
                }
            }
            Pattern::Alt(items) => {
                for item in items {
                    self.build(item, start, end);
                }
            }
            Pattern::Star(inner) | Pattern::Plus(inner) => {
                let inner_start = self.add_state();
                let inner_end = self.add_state();
                self.build(inner, inner_start, inner_end);
                self.add_epsilon(start, inner_start);
                self.add_epsilon(inner_end, inner_start);
                self.add_epsilon(inner_end, end);
                if matches!(pattern, Pattern::Star(_)) {
                    self.add_epsilon(start, end);
                }
            }
            Pattern::Opt(inner) => {
                self.build(inner, start, end);
                self.add_epsilon(start, end);
            }
        }
    }

    /// Compute epsilon closure of NFA states, sorted for use as a DFA key
    fn epsilon_closure(&self, states: &[u32]) -> SmallVec<[u32; 8]> {
        let mut closure: HashSet<u32> = states.iter().copied().collect();
        let mut stack: Vec<u32> = states.to_vec();

        while let Some(state) = stack.pop() {
            for &next in &self.states[state as usize].epsilon_transitions {
                if closure.insert(next) {
                    stack.push(next);
                }
            }
        }

        let mut sorted: SmallVec<[u32; 8]> = closure.into_iter().collect();
        sorted.sort_unstable();
        sorted
    }
}

/// DFA state with transitions sorted by range start
#[derive(Debug, Clone, Default)]
struct DfaState {
    transitions: Vec<(CharRange, StateId)>,
    accepting: bool,
}

impl DfaState {
    fn find_transition(&self, c: char) -> Option<StateId> {
        self.transitions
            .binary_search_by(|(range, _)| {
                if c < *range.start() {
                    std::cmp::Ordering::Greater
                } else if c > *range.end() {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
            .map(|idx| self.transitions[idx].1)
    }
}

/// Deterministic automaton compiled from a [`Pattern`].
#[derive(Debug, Clone)]
pub struct Dfa {
    states: Vec<DfaState>,
    start: StateId,
}

impl Dfa {
    /// Compile a pattern via Thompson construction and subset construction.
    #[must_use]
    pub fn compile(pattern: &Pattern) -> Self {
        let nfa = Nfa::from_pattern(pattern);
        let mut dfa = Self {
            states: Vec::new(),
            start: StateId(0),
        };

        let mut state_map: HashMap<SmallVec<[u32; 8]>, StateId> = HashMap::new();
        let mut worklist: Vec<SmallVec<[u32; 8]>> = Vec::new();

        let start_closure = nfa.epsilon_closure(&[nfa.start]);
        dfa.start = dfa.add_state();
        state_map.insert(start_closure.clone(), dfa.start);
        worklist.push(start_closure);

        while let Some(nfa_states) = worklist.pop() {
            let Some(&dfa_id) = state_map.get(&nfa_states) else {
                continue;
            };

            let moves: Vec<(CharRange, u32)> = nfa_states
                .iter()
                .flat_map(|&s| nfa.states[s as usize].transitions.iter().cloned())
                .collect();

            let mut transitions = Vec::new();
            for (lo, hi) in disjoint_intervals(&moves) {
                let targets: Vec<u32> = moves
                    .iter()
                    .filter(|(range, _)| *range.start() <= lo && hi <= *range.end())
                    .map(|&(_, target)| target)
                    .collect();
                if targets.is_empty() {
                    continue;
                }
                let closure = nfa.epsilon_closure(&targets);
                let target = match state_map.get(&closure) {
                    Some(&id) => id,
                    None => {
                        let id = dfa.add_state();
                        state_map.insert(closure.clone(), id);
                        worklist.push(closure);
                        id
                    }
                };
                transitions.push((lo..=hi, target));
            }

            transitions.sort_by_key(|(range, _)| *range.start());
            let state = &mut dfa.states[dfa_id.0 as usize];
            state.transitions = transitions;
            state.accepting = nfa_states.contains(&nfa.accept);
        }

        dfa
    }

    fn add_state(&mut self) -> StateId {
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(u32::MAX));
        self.states.push(DfaState::default());
        id
    }

    fn state(&self, id: StateId) -> &DfaState {
        &self.states[id.0 as usize]
    }

    /// Number of DFA states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Length of the longest accepted prefix of `chars`, if any.
    pub fn longest_match(&self, chars: impl IntoIterator<Item = char>) -> Option<usize> {
        let mut state = self.start;
        let mut best = self.state(state).accepting.then_some(0);
        for (consumed, c) in chars.into_iter().enumerate() {
            let Some(next) = self.state(state).find_transition(c) else {
                break;
            };
            state = next;
            if self.state(state).accepting {
                best = Some(consumed + 1);
            }
        }
        best
    }

    /// Whether the whole of `chars` is accepted.
    pub fn accepts(&self, chars: impl IntoIterator<Item = char>) -> bool {
        let mut state = self.start;
        for c in chars {
            match self.state(state).find_transition(c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.state(state).accepting
    }
}

/// Split overlapping transition ranges into disjoint intervals on every cut
/// point. Intervals never contain surrogate code points.
fn disjoint_intervals(moves: &[(CharRange, u32)]) -> Vec<(char, char)> {
    let mut cuts: Vec<u32> = Vec::with_capacity(moves.len() * 2);
    for (range, _) in moves {
        cuts.push(*range.start() as u32);
        cuts.push(*range.end() as u32 + 1);
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut intervals = Vec::new();
    for window in cuts.windows(2) {
        let mut lo = window[0];
        let mut hi = window[1] - 1;
        if (0xD800..=0xDFFF).contains(&lo) {
            lo = 0xE000;
        }
        if (0xD800..=0xDFFF).contains(&hi) {
            hi = 0xD7FF;
        }
        if lo > hi {
            continue;
        }
        if let (Some(lo), Some(hi)) = (char::from_u32(lo), char::from_u32(hi)) {
            intervals.push((lo, hi));
        }
    }
    intervals
}
