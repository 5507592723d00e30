//! Deterministic byte acceptors driving term-dictionary intersection
//!
//! An [`Acceptor`] is a DFA over `byte ∪ {ρ}` where ρ is the "any other
//! byte" transition. Accepting states may carry a payload byte (the achieved
//! edit distance for Levenshtein acceptors). Acceptors implement
//! [`fst::Automaton`], so the term dictionary's FST performs the
//! intersection and skips subtrees that cannot reach a productive state.

pub mod levenshtein;
pub mod wildcard;

pub use levenshtein::{description, ParametricDescription};
pub use wildcard::{wildcard_acceptor, wildcard_kind, WildcardKind};

/// State identifier within an acceptor
pub type StateId = u32;

#[derive(Clone, Debug, Default)]
struct State {
    /// Explicit byte arcs, sorted by byte
    arcs: Vec<(u8, StateId)>,
    /// Target for every byte without an explicit arc
    rho: Option<StateId>,
    accept: bool,
    payload: Option<u8>,
    /// An accepting state is reachable from here
    productive: bool,
}

/// Deterministic, epsilon-free finite automaton over bytes.
#[derive(Clone, Debug)]
pub struct Acceptor {
    states: Vec<State>,
    start: StateId,
}

impl Acceptor {
    /// Accepts exactly the given byte string.
    pub fn exact(term: &[u8]) -> Self {
        let mut builder = AcceptorBuilder::new();
        let mut state = builder.add_state();
        for &byte in term {
            let next = builder.add_state();
            builder.add_arc(state, byte, next);
            state = next;
        }
        builder.set_accept(state, None);
        builder.finish()
    }

    /// Accepts every byte string starting with the given prefix.
    pub fn prefix(prefix: &[u8]) -> Self {
        let mut builder = AcceptorBuilder::new();
        let mut state = builder.add_state();
        for &byte in prefix {
            let next = builder.add_state();
            builder.add_arc(state, byte, next);
            state = next;
        }
        builder.set_accept(state, None);
        builder.set_rho(state, state);
        builder.finish()
    }

    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// Follow the transition for `byte`, if any.
    pub fn step(&self, state: StateId, byte: u8) -> Option<StateId> {
        let state = &self.states[state as usize];
        match state.arcs.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(idx) => Some(state.arcs[idx].1),
            Err(_) => state.rho,
        }
    }

    pub fn is_accept(&self, state: StateId) -> bool {
        self.states[state as usize].accept
    }

    /// Payload byte of an accepting state, if it carries one.
    pub fn payload(&self, state: StateId) -> Option<u8> {
        self.states[state as usize].payload
    }

    /// An accepting state is reachable from `state`.
    pub fn is_productive(&self, state: StateId) -> bool {
        self.states[state as usize].productive
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Run the whole input through the automaton.
    pub fn accepts(&self, input: &[u8]) -> bool {
        self.final_state(input)
            .map(|s| self.is_accept(s))
            .unwrap_or(false)
    }

    /// Payload of the state reached by the whole input, if it is accepting.
    pub fn payload_for(&self, input: &[u8]) -> Option<u8> {
        self.final_state(input)
            .filter(|&s| self.is_accept(s))
            .and_then(|s| self.payload(s))
    }

    fn final_state(&self, input: &[u8]) -> Option<StateId> {
        let mut state = self.start;
        for &byte in input {
            state = self.step(state, byte)?;
        }
        Some(state)
    }

    /// Verify the automaton is well formed: deterministic (strictly sorted
    /// arcs), epsilon-free by construction, and with in-range targets.
    ///
    /// Filters degrade to an empty prepared query when this fails.
    pub fn validate(&self) -> bool {
        if self.start as usize >= self.states.len() {
            return false;
        }
        for state in &self.states {
            for window in state.arcs.windows(2) {
                if window[0].0 >= window[1].0 {
                    return false;
                }
            }
            if state
                .arcs
                .iter()
                .any(|&(_, to)| to as usize >= self.states.len())
            {
                return false;
            }
            if let Some(rho) = state.rho {
                if rho as usize >= self.states.len() {
                    return false;
                }
            }
        }
        true
    }

    /// Mark every state from which an accepting state is reachable.
    fn compute_productive(&mut self) {
        // reverse adjacency over explicit arcs and rho
        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
        for (from, state) in self.states.iter().enumerate() {
            for &(_, to) in &state.arcs {
                reverse[to as usize].push(from as StateId);
            }
            if let Some(rho) = state.rho {
                reverse[rho as usize].push(from as StateId);
            }
        }

        let mut queue: Vec<StateId> = Vec::new();
        for (id, state) in self.states.iter_mut().enumerate() {
            if state.accept {
                state.productive = true;
                queue.push(id as StateId);
            }
        }
        while let Some(id) = queue.pop() {
            for &from in &reverse[id as usize] {
                if !self.states[from as usize].productive {
                    self.states[from as usize].productive = true;
                    queue.push(from);
                }
            }
        }
    }
}

impl fst::Automaton for Acceptor {
    type State = Option<StateId>;

    fn start(&self) -> Self::State {
        Some(self.start)
    }

    fn is_match(&self, state: &Self::State) -> bool {
        state.map_or(false, |s| self.is_accept(s))
    }

    fn can_match(&self, state: &Self::State) -> bool {
        state.map_or(false, |s| self.is_productive(s))
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        state.and_then(|s| self.step(s, byte))
    }
}

/// Incremental acceptor construction used by the compilers in this module.
pub(crate) struct AcceptorBuilder {
    states: Vec<State>,
}

impl AcceptorBuilder {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(State::default());
        id
    }

    pub fn add_arc(&mut self, from: StateId, byte: u8, to: StateId) {
        self.states[from as usize].arcs.push((byte, to));
    }

    pub fn set_rho(&mut self, from: StateId, to: StateId) {
        self.states[from as usize].rho = Some(to);
    }

    pub fn set_accept(&mut self, state: StateId, payload: Option<u8>) {
        let state = &mut self.states[state as usize];
        state.accept = true;
        state.payload = payload;
    }

    /// Sort arcs and compute productive states. State 0 is the start.
    pub fn finish(mut self) -> Acceptor {
        for state in &mut self.states {
            state.arcs.sort_by_key(|&(b, _)| b);
            state.arcs.dedup_by_key(|&mut (b, _)| b);
        }
        let mut acceptor = Acceptor {
            states: self.states,
            start: 0,
        };
        acceptor.compute_productive();
        acceptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let acceptor = Acceptor::exact(b"foo");
        assert!(acceptor.accepts(b"foo"));
        assert!(!acceptor.accepts(b"fo"));
        assert!(!acceptor.accepts(b"fooo"));
        assert!(!acceptor.accepts(b"bar"));
        assert!(acceptor.validate());
    }

    #[test]
    fn test_exact_empty() {
        let acceptor = Acceptor::exact(b"");
        assert!(acceptor.accepts(b""));
        assert!(!acceptor.accepts(b"a"));
    }

    #[test]
    fn test_prefix() {
        let acceptor = Acceptor::prefix(b"fo");
        assert!(acceptor.accepts(b"fo"));
        assert!(acceptor.accepts(b"foo"));
        assert!(acceptor.accepts(b"fox trot"));
        assert!(!acceptor.accepts(b"f"));
        assert!(!acceptor.accepts(b"bar"));
    }

    #[test]
    fn test_match_all_via_empty_prefix() {
        let acceptor = Acceptor::prefix(b"");
        assert!(acceptor.accepts(b""));
        assert!(acceptor.accepts(b"anything"));
    }

    #[test]
    fn test_productive_pruning() {
        let acceptor = Acceptor::exact(b"ab");
        let start = acceptor.start_state();
        assert!(acceptor.is_productive(start));
        // stepping off the single path yields no state at all
        assert_eq!(acceptor.step(start, b'x'), None);
    }

    #[test]
    fn test_validate_rejects_duplicate_arcs() {
        let mut builder = AcceptorBuilder::new();
        let s0 = builder.add_state();
        let s1 = builder.add_state();
        builder.add_arc(s0, b'a', s1);
        builder.add_arc(s0, b'a', s0);
        builder.set_accept(s1, None);
        // finish() dedups; forge the duplicate back to exercise validate()
        let mut acceptor = builder.finish();
        acceptor.states[0].arcs = vec![(b'a', 1), (b'a', 0)];
        assert!(!acceptor.validate());
    }
}
