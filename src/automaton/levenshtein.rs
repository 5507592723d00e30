//! Parametric Levenshtein automata
//!
//! A [`ParametricDescription`] is a precomputed transition table keyed only
//! by `(max_distance, with_transpositions)`: its states are normalized sets
//! of NFA positions `(offset, edits)` relative to a base offset, and its
//! transitions are indexed by the characteristic bit-vector of the next
//! input byte against the query term window. Materializing an [`Acceptor`]
//! for a concrete term is then a cheap walk of `(parametric state, base)`
//! pairs; accepting states carry the achieved edit distance as payload.
//!
//! Descriptions are computed once per parameter pair and cached
//! process-wide. Distances above the supported bounds have no description
//! and callers degrade to an empty result.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::{Acceptor, AcceptorBuilder, StateId};

/// Largest supported distance without transpositions
pub const MAX_DISTANCE: u8 = 3;
/// Largest supported distance with transpositions
pub const MAX_DISTANCE_WITH_TRANSPOSITIONS: u8 = 2;

/// One NFA position: `offset` query bytes consumed with `edits` errors.
/// `transpose` marks the intermediate position of a pending transposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Position {
    offset: u8,
    edits: u8,
    transpose: bool,
}

impl Position {
    fn subsumes(&self, other: &Position) -> bool {
        match (self.transpose, other.transpose) {
            (false, false) => {
                self.edits < other.edits
                    && (other.offset as i16 - self.offset as i16).unsigned_abs()
                        <= (other.edits - self.edits) as u16
            }
            (true, true) => self.offset == other.offset && self.edits < other.edits,
            // cross-kind subsumption is intentionally not applied; the table
            // only grows, correctness is unaffected
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    /// Target parametric state (0 is the dead state)
    state: u32,
    /// How far the base offset advances
    offset_delta: u8,
}

/// Precomputed transition table for one `(distance, transpositions)` pair.
pub struct ParametricDescription {
    max_distance: u8,
    transpositions: bool,
    /// Characteristic vector width: 3d + 1 bits
    chi_width: u8,
    /// states[0] is the dead state, states[1] the initial one
    states: Vec<Vec<Position>>,
    /// Row-major: `transitions[state * (1 << chi_width) + chi]`
    transitions: Vec<Transition>,
}

impl ParametricDescription {
    pub fn max_distance(&self) -> u8 {
        self.max_distance
    }

    pub fn with_transpositions(&self) -> bool {
        self.transpositions
    }

    fn compute(max_distance: u8, transpositions: bool) -> Self {
        let chi_width = 3 * max_distance + 1;
        let num_chi: usize = 1 << chi_width;

        let initial = vec![Position {
            offset: 0,
            edits: 0,
            transpose: false,
        }];
        let mut states: Vec<Vec<Position>> = vec![Vec::new(), initial];
        let mut index: HashMap<Vec<Position>, u32> = HashMap::new();
        index.insert(states[0].clone(), 0);
        index.insert(states[1].clone(), 1);

        let mut transitions: Vec<Transition> = Vec::new();
        // the dead state only reaches itself
        transitions.resize(
            num_chi,
            Transition {
                state: 0,
                offset_delta: 0,
            },
        );

        let mut current = 1;
        while current < states.len() {
            let positions = states[current].clone();
            for chi in 0..num_chi as u32 {
                let stepped = step(&positions, chi, max_distance, transpositions);
                let (normalized, shift) = normalize(stepped);
                let id = match index.get(&normalized) {
                    Some(&id) => id,
                    None => {
                        let id = states.len() as u32;
                        index.insert(normalized.clone(), id);
                        states.push(normalized);
                        id
                    }
                };
                transitions.push(Transition {
                    state: id,
                    offset_delta: shift,
                });
            }
            current += 1;
        }

        Self {
            max_distance,
            transpositions,
            chi_width,
            states,
            transitions,
        }
    }

    fn transition(&self, state: u32, chi: u32) -> Transition {
        let num_chi = 1usize << self.chi_width;
        self.transitions[state as usize * num_chi + chi as usize]
    }

    /// Distance achieved when the input ends in `state` with the given base
    /// offset, if within bounds: remaining query bytes are deletions.
    fn state_distance(&self, state: u32, base: usize, term_len: usize) -> Option<u8> {
        self.states[state as usize]
            .iter()
            .filter(|p| !p.transpose)
            .filter_map(|p| {
                let consumed = base + p.offset as usize;
                let total = p.edits as usize + term_len.saturating_sub(consumed);
                (total <= self.max_distance as usize).then_some(total as u8)
            })
            .min()
    }

    /// Materialize a deterministic byte acceptor for `term`. Accepting
    /// states carry the achieved distance as payload.
    pub fn build_acceptor(&self, term: &[u8]) -> Acceptor {
        let n = term.len();
        let width = self.chi_width as usize;

        let mut builder = AcceptorBuilder::new();
        let mut ids: HashMap<(u32, usize), StateId> = HashMap::new();

        let start = builder.add_state();
        if let Some(distance) = self.state_distance(1, 0, n) {
            builder.set_accept(start, Some(distance));
        }
        ids.insert((1, 0), start);
        let mut queue = vec![(1u32, 0usize)];

        while let Some((pstate, base)) = queue.pop() {
            let from = ids[&(pstate, base)];
            let window = &term[base.min(n)..(base + width).min(n)];

            let mut bytes: BTreeSet<u8> = BTreeSet::new();
            bytes.extend(window.iter().copied());

            for byte in bytes {
                let mut chi = 0u32;
                for (k, &b) in window.iter().enumerate() {
                    if b == byte {
                        chi |= 1 << k;
                    }
                }
                if let Some(to) = self.materialize_target(
                    pstate, base, chi, n, &mut builder, &mut ids, &mut queue,
                ) {
                    builder.add_arc(from, byte, to);
                }
            }

            // every byte not in the window: characteristic vector 0
            if let Some(to) =
                self.materialize_target(pstate, base, 0, n, &mut builder, &mut ids, &mut queue)
            {
                builder.set_rho(from, to);
            }
        }

        builder.finish()
    }

    #[allow(clippy::too_many_arguments)]
    fn materialize_target(
        &self,
        pstate: u32,
        base: usize,
        chi: u32,
        term_len: usize,
        builder: &mut AcceptorBuilder,
        ids: &mut HashMap<(u32, usize), StateId>,
        queue: &mut Vec<(u32, usize)>,
    ) -> Option<StateId> {
        let transition = self.transition(pstate, chi);
        if transition.state == 0 {
            return None;
        }
        let key = (transition.state, base + transition.offset_delta as usize);
        let id = match ids.get(&key) {
            Some(&id) => id,
            None => {
                let id = builder.add_state();
                if let Some(distance) = self.state_distance(key.0, key.1, term_len) {
                    builder.set_accept(id, Some(distance));
                }
                ids.insert(key, id);
                queue.push(key);
                id
            }
        };
        Some(id)
    }
}

fn step(positions: &[Position], chi: u32, max_distance: u8, transpositions: bool) -> Vec<Position> {
    let mut out = Vec::new();
    for p in positions {
        let r = p.offset as u32;
        let e = p.edits;
        if p.transpose {
            if chi >> r & 1 == 1 {
                out.push(Position {
                    offset: p.offset + 2,
                    edits: e,
                    transpose: false,
                });
            }
            continue;
        }
        if chi >> r & 1 == 1 {
            out.push(Position {
                offset: p.offset + 1,
                edits: e,
                transpose: false,
            });
        }
        if e < max_distance {
            // insertion
            out.push(Position {
                offset: p.offset,
                edits: e + 1,
                transpose: false,
            });
            // substitution
            out.push(Position {
                offset: p.offset + 1,
                edits: e + 1,
                transpose: false,
            });
            // delete j - 1 query bytes, then match
            for j in 2..=(max_distance - e + 1) as u32 {
                if chi >> (r + j - 1) & 1 == 1 {
                    out.push(Position {
                        offset: p.offset + j as u8,
                        edits: e + (j as u8 - 1),
                        transpose: false,
                    });
                }
            }
            if transpositions && chi >> (r + 1) & 1 == 1 {
                out.push(Position {
                    offset: p.offset,
                    edits: e + 1,
                    transpose: true,
                });
            }
        }
    }
    out
}

fn normalize(mut positions: Vec<Position>) -> (Vec<Position>, u8) {
    positions.sort_unstable();
    positions.dedup();

    let mut kept = Vec::with_capacity(positions.len());
    for (i, q) in positions.iter().enumerate() {
        let subsumed = positions
            .iter()
            .enumerate()
            .any(|(j, p)| i != j && p.subsumes(q));
        if !subsumed {
            kept.push(*q);
        }
    }

    if kept.is_empty() {
        return (kept, 0);
    }

    let min = kept.iter().map(|p| p.offset).min().unwrap_or(0);
    for p in &mut kept {
        p.offset -= min;
    }
    (kept, min)
}

static DESCRIPTIONS: LazyLock<RwLock<HashMap<(u8, bool), Arc<ParametricDescription>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Default description provider: computes and caches a description for the
/// parameter pair, or returns `None` for unsupported distances (including 0,
/// which callers handle as an exact-term filter).
pub fn description(max_distance: u8, transpositions: bool) -> Option<Arc<ParametricDescription>> {
    let limit = if transpositions {
        MAX_DISTANCE_WITH_TRANSPOSITIONS
    } else {
        MAX_DISTANCE
    };
    if max_distance == 0 || max_distance > limit {
        return None;
    }

    let key = (max_distance, transpositions);
    if let Some(description) = DESCRIPTIONS.read().get(&key) {
        return Some(description.clone());
    }
    let computed = Arc::new(ParametricDescription::compute(max_distance, transpositions));
    Some(DESCRIPTIONS.write().entry(key).or_insert(computed).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference edit distance over bytes
    fn reference_distance(a: &[u8], b: &[u8], transpositions: bool) -> usize {
        let (n, m) = (a.len(), b.len());
        let mut dp = vec![vec![0usize; m + 1]; n + 1];
        for (i, row) in dp.iter_mut().enumerate() {
            row[0] = i;
        }
        for j in 0..=m {
            dp[0][j] = j;
        }
        for i in 1..=n {
            for j in 1..=m {
                let cost = usize::from(a[i - 1] != b[j - 1]);
                let mut best = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
                if transpositions
                    && i > 1
                    && j > 1
                    && a[i - 1] == b[j - 2]
                    && a[i - 2] == b[j - 1]
                {
                    best = best.min(dp[i - 2][j - 2] + 1);
                }
                dp[i][j] = best;
            }
        }
        dp[n][m]
    }

    fn check_against_reference(term: &[u8], distance: u8, transpositions: bool, inputs: &[&[u8]]) {
        let description = description(distance, transpositions).unwrap();
        let acceptor = description.build_acceptor(term);
        assert!(acceptor.validate());
        for input in inputs {
            let expected = reference_distance(term, input, transpositions);
            let accepted = acceptor.accepts(input);
            assert_eq!(
                accepted,
                expected <= distance as usize,
                "term={:?} input={:?} d={} t={}",
                String::from_utf8_lossy(term),
                String::from_utf8_lossy(input),
                distance,
                transpositions,
            );
            if accepted {
                assert_eq!(
                    acceptor.payload_for(input),
                    Some(expected as u8),
                    "payload for input={:?}",
                    String::from_utf8_lossy(input),
                );
            }
        }
    }

    #[test]
    fn test_distance_one() {
        check_against_reference(
            b"bar",
            1,
            false,
            &[b"bar", b"baz", b"bbar", b"barr", b"br", b"foo", b"ba", b"bra", b"xbar"],
        );
    }

    #[test]
    fn test_distance_two() {
        check_against_reference(
            b"hello",
            2,
            false,
            &[
                b"hello", b"hallo", b"help", b"hell", b"he", b"hel", b"helloooo", b"yellow",
                b"jello", b"hlelo",
            ],
        );
    }

    #[test]
    fn test_transpositions() {
        let description = description(1, true).unwrap();
        let acceptor = description.build_acceptor(b"ab");
        assert!(acceptor.accepts(b"ba"));
        assert_eq!(acceptor.payload_for(b"ba"), Some(1));

        // without transpositions a swap costs two edits
        let plain = super::description(1, false).unwrap();
        let acceptor = plain.build_acceptor(b"ab");
        assert!(!acceptor.accepts(b"ba"));
    }

    #[test]
    fn test_exhaustive_small_alphabet() {
        // every string over {a, b} up to length 5 against "abab"
        let term = b"abab";
        for &(d, t) in &[(1u8, false), (2u8, false), (1u8, true), (2u8, true)] {
            let description = description(d, t).unwrap();
            let acceptor = description.build_acceptor(term);
            let mut inputs: Vec<Vec<u8>> = vec![Vec::new()];
            let mut frontier = vec![Vec::new()];
            for _ in 0..5 {
                let mut next = Vec::new();
                for input in &frontier {
                    for &b in b"ab" {
                        let mut extended = input.clone();
                        extended.push(b);
                        next.push(extended);
                    }
                }
                inputs.extend(next.iter().cloned());
                frontier = next;
            }
            for input in &inputs {
                let expected = reference_distance(term, input, t) <= d as usize;
                assert_eq!(
                    acceptor.accepts(input),
                    expected,
                    "input={:?} d={} t={}",
                    String::from_utf8_lossy(input),
                    d,
                    t,
                );
            }
        }
    }

    #[test]
    fn test_unavailable_description() {
        assert!(description(0, false).is_none());
        assert!(description(MAX_DISTANCE + 1, false).is_none());
        assert!(description(MAX_DISTANCE_WITH_TRANSPOSITIONS + 1, true).is_none());
    }

    #[test]
    fn test_description_is_cached() {
        let a = description(1, false).unwrap();
        let b = description(1, false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.max_distance(), 1);
        assert!(!a.with_transpositions());
    }

    #[test]
    fn test_empty_term() {
        let description = description(2, false).unwrap();
        let acceptor = description.build_acceptor(b"");
        assert!(acceptor.accepts(b""));
        assert_eq!(acceptor.payload_for(b""), Some(0));
        assert!(acceptor.accepts(b"ab"));
        assert!(!acceptor.accepts(b"abc"));
    }
}
