//! Term collectors for multi-term filters
//!
//! [`LimitedSampleCollector`] keeps at most K accepted terms across all
//! segments, ordered by key descending with deterministic tie-breaks (term
//! bytes ascending, then segment ordinal). Evicted terms keep matching: the
//! documents of their posting lists land in the segment's unscored bitset.
//! [`AllTermsCollector`] admits every visited term; it serves orders with no
//! scored-terms limit.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use ordered_float::NotNan;
use tracing::warn;

use super::collectors::{FieldCollectors, TermCollectors};
use super::multiterm::SegmentState;
use super::sort::{Order, TermStats};
use crate::segment::{DocIterator, Index, SegmentReader, TermCookie, TermReader};

/// One accepted term as reported by a filter's acceptor iteration
pub struct TermCandidate {
    pub segment_ord: usize,
    pub term: Vec<u8>,
    pub docs_count: u32,
    pub total_term_frequency: u64,
    pub payload: Option<u8>,
    pub cookie: TermCookie,
    /// Ordering key for the top-K cut; `None` marks a term that matches but
    /// must not be scored (its documents stay in the result unscored)
    pub key: Option<f32>,
    /// Boost applied to the term's scorers when it survives the cut
    pub boost: f32,
}

struct Admitted {
    candidate: TermCandidate,
    key: NotNan<f32>,
}

impl Admitted {
    /// "Goodness": greater is better. Key descending, term bytes ascending,
    /// segment ordinal ascending.
    fn cmp_goodness(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.candidate.term.cmp(&self.candidate.term))
            .then_with(|| other.candidate.segment_ord.cmp(&self.candidate.segment_ord))
    }
}

impl PartialEq for Admitted {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_goodness(other) == Ordering::Equal
    }
}

impl Eq for Admitted {}

impl PartialOrd for Admitted {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Admitted {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_goodness(other)
    }
}

/// Per-segment bookkeeping shared by the collector variants
struct SegmentSlot<'a> {
    segment: &'a SegmentReader,
    reader: &'a TermReader,
    state: SegmentState,
}

fn add_unscored(slot: &mut SegmentSlot<'_>, candidate: &TermCandidate) {
    let Some(info) = slot.reader.seek_cookie(&candidate.cookie) else {
        warn!("stale term cookie while collecting unscored documents");
        return;
    };
    match slot.reader.postings(info) {
        Ok(mut postings) => {
            while postings.next() {
                slot.state.unscored_docs.insert(postings.doc().as_u32());
            }
        }
        Err(e) => {
            warn!(error = %e, "abandoning unscored term postings");
        }
    }
}

/// Finalize admitted candidates into per-segment states and per-term stats
/// buffers: field stats fan out once per visited (segment, field), term
/// stats once per admitted term row.
fn finalize(
    mut admitted: Vec<TermCandidate>,
    mut slots: HashMap<usize, SegmentSlot<'_>>,
    index: &Index,
    order: &Order,
) -> (HashMap<usize, SegmentState>, Vec<Vec<u8>>) {
    // deterministic stat offsets
    admitted.sort_by(|a, b| {
        a.segment_ord
            .cmp(&b.segment_ord)
            .then_with(|| a.term.cmp(&b.term))
    });

    let mut field_collectors = FieldCollectors::new(order);
    let mut visited: Vec<usize> = slots.keys().copied().collect();
    visited.sort_unstable();
    for ord in visited {
        let slot = &slots[&ord];
        field_collectors.collect(slot.segment, slot.reader);
    }

    let mut term_collectors = TermCollectors::new(order, admitted.len());
    for (row, candidate) in admitted.iter().enumerate() {
        let slot = &slots[&candidate.segment_ord];
        let stats = TermStats {
            docs_count: candidate.docs_count,
            total_term_frequency: candidate.total_term_frequency,
            payload: candidate.payload,
        };
        term_collectors.collect(slot.segment, slot.reader, row, &stats);
    }

    let mut stats_buffers = Vec::with_capacity(admitted.len());
    for row in 0..admitted.len() {
        let mut stats = vec![0u8; order.stats_size()];
        term_collectors.finish_row(row, &mut stats, &field_collectors, index, order);
        stats_buffers.push(stats);
    }

    for (row, candidate) in admitted.into_iter().enumerate() {
        let slot = slots
            .get_mut(&candidate.segment_ord)
            .expect("admitted term without segment slot");
        slot.state.scored_states_estimation += candidate.docs_count as u64;
        slot.state
            .scored_states
            .push((candidate.cookie, row, candidate.boost));
    }

    let states = slots
        .into_iter()
        .filter(|(_, slot)| !slot.state.is_empty())
        .map(|(ord, slot)| (ord, slot.state))
        .collect();
    (states, stats_buffers)
}

/// Keeps at most `limit` highest-keyed terms across segments; everything
/// else remains matching but unscored.
pub struct LimitedSampleCollector<'a> {
    limit: usize,
    heap: BinaryHeap<Reverse<Admitted>>,
    slots: HashMap<usize, SegmentSlot<'a>>,
    current: Option<usize>,
}

impl<'a> LimitedSampleCollector<'a> {
    /// `limit == 0` scores nothing: every visited term's documents are
    /// collected as unscored.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::new(),
            slots: HashMap::new(),
            current: None,
        }
    }

    /// Register the segment the following candidates belong to
    pub fn prepare(&mut self, segment_ord: usize, segment: &'a SegmentReader, reader: &'a TermReader) {
        self.slots.entry(segment_ord).or_insert_with(|| SegmentSlot {
            segment,
            reader,
            state: SegmentState::default(),
        });
        self.current = Some(segment_ord);
    }

    /// Offer one accepted term
    pub fn collect(&mut self, candidate: TermCandidate) {
        debug_assert_eq!(self.current, Some(candidate.segment_ord));

        let key = match candidate.key {
            Some(key) if self.limit > 0 => key,
            _ => {
                // unscorable term, or nothing is scored at all
                if let Some(slot) = self.slots.get_mut(&candidate.segment_ord) {
                    add_unscored(slot, &candidate);
                }
                return;
            }
        };
        let Ok(key) = NotNan::new(key) else {
            if let Some(slot) = self.slots.get_mut(&candidate.segment_ord) {
                add_unscored(slot, &candidate);
            }
            return;
        };

        let entry = Admitted { candidate, key };
        if self.heap.len() < self.limit {
            self.heap.push(Reverse(entry));
            return;
        }

        // compare against the current worst
        let worst = self.heap.peek().expect("non-empty heap");
        if entry.cmp_goodness(&worst.0) == Ordering::Greater {
            let evicted = self.heap.pop().expect("non-empty heap").0;
            if let Some(slot) = self.slots.get_mut(&evicted.candidate.segment_ord) {
                add_unscored(slot, &evicted.candidate);
            }
            self.heap.push(Reverse(entry));
        } else if let Some(slot) = self.slots.get_mut(&entry.candidate.segment_ord) {
            add_unscored(slot, &entry.candidate);
        }
    }

    /// Finish collecting: evaluate stats and emit per-segment states
    pub fn finish(self, index: &Index, order: &Order) -> (HashMap<usize, SegmentState>, Vec<Vec<u8>>) {
        let admitted: Vec<TermCandidate> = self
            .heap
            .into_iter()
            .map(|Reverse(entry)| entry.candidate)
            .collect();
        finalize(admitted, self.slots, index, order)
    }
}

/// Admits every visited term; used when the order carries no scored-terms
/// limit.
pub struct AllTermsCollector<'a> {
    admitted: Vec<TermCandidate>,
    slots: HashMap<usize, SegmentSlot<'a>>,
    current: Option<usize>,
}

impl<'a> AllTermsCollector<'a> {
    pub fn new() -> Self {
        Self {
            admitted: Vec::new(),
            slots: HashMap::new(),
            current: None,
        }
    }

    /// Register the segment the following candidates belong to
    pub fn prepare(&mut self, segment_ord: usize, segment: &'a SegmentReader, reader: &'a TermReader) {
        self.slots.entry(segment_ord).or_insert_with(|| SegmentSlot {
            segment,
            reader,
            state: SegmentState::default(),
        });
        self.current = Some(segment_ord);
    }

    /// Offer one accepted term
    pub fn collect(&mut self, candidate: TermCandidate) {
        debug_assert_eq!(self.current, Some(candidate.segment_ord));
        if candidate.key.is_none() {
            if let Some(slot) = self.slots.get_mut(&candidate.segment_ord) {
                add_unscored(slot, &candidate);
            }
            return;
        }
        self.admitted.push(candidate);
    }

    /// Finish collecting: evaluate stats and emit per-segment states
    pub fn finish(self, index: &Index, order: &Order) -> (HashMap<usize, SegmentState>, Vec<Vec<u8>>) {
        finalize(self.admitted, self.slots, index, order)
    }
}

impl Default for AllTermsCollector<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{SegmentId, SegmentWriter};

    fn segment(terms: &[&str]) -> SegmentReader {
        let mut writer = SegmentWriter::new(SegmentId::new(1));
        for term in terms {
            writer.begin_document();
            writer.index_term("f", term.as_bytes());
        }
        writer.build().unwrap()
    }

    fn candidate(
        reader: &TermReader,
        segment_ord: usize,
        term: &str,
        key: Option<f32>,
    ) -> TermCandidate {
        let mut iter = reader.iterator();
        assert!(iter.seek(term.as_bytes()));
        assert_eq!(iter.value(), term.as_bytes());
        TermCandidate {
            segment_ord,
            term: term.as_bytes().to_vec(),
            docs_count: iter.docs_count(),
            total_term_frequency: iter.info().total_term_frequency,
            payload: None,
            cookie: iter.cookie(),
            key,
            boost: 1.0,
        }
    }

    #[test]
    fn test_top_k_cut_is_deterministic() {
        let seg = segment(&["alpha", "beta", "gamma", "delta"]);
        let reader = seg.field("f").unwrap();
        let index = Index::new(Vec::new());
        let order = Order::prepare(vec![Box::new(crate::search::BoostSort)]);

        let mut collector = LimitedSampleCollector::new(2);
        collector.prepare(0, &seg, reader);
        // equal keys: ties broken by term bytes ascending
        for term in ["gamma", "alpha", "delta", "beta"] {
            let c = candidate(reader, 0, term, Some(1.0));
            collector.collect(c);
        }
        let (states, stats) = collector.finish(&index, &order);
        assert_eq!(stats.len(), 2);

        let state = states.get(&0).unwrap();
        let mut scored: Vec<&[u8]> = state
            .scored_states
            .iter()
            .map(|(cookie, _, _)| cookie.term())
            .collect();
        scored.sort();
        assert_eq!(scored, vec![b"alpha".as_ref(), b"beta".as_ref()]);
        // the two evicted terms' documents are unscored but still matched
        assert_eq!(state.unscored_docs.len(), 2);
    }

    #[test]
    fn test_zero_limit_scores_nothing() {
        let seg = segment(&["a", "b"]);
        let reader = seg.field("f").unwrap();
        let index = Index::new(Vec::new());
        let order = Order::empty();

        let mut collector = LimitedSampleCollector::new(0);
        collector.prepare(0, &seg, reader);
        collector.collect(candidate(reader, 0, "a", Some(1.0)));
        collector.collect(candidate(reader, 0, "b", Some(0.5)));
        let (states, stats) = collector.finish(&index, &order);

        assert!(stats.is_empty());
        let state = states.get(&0).unwrap();
        assert!(state.scored_states.is_empty());
        assert_eq!(state.unscored_docs.len(), 2);
    }

    #[test]
    fn test_unscorable_candidate_goes_unscored() {
        let seg = segment(&["a", "b"]);
        let reader = seg.field("f").unwrap();
        let index = Index::new(Vec::new());
        let order = Order::prepare(vec![Box::new(crate::search::BoostSort)]);

        let mut collector = LimitedSampleCollector::new(10);
        collector.prepare(0, &seg, reader);
        collector.collect(candidate(reader, 0, "a", None));
        collector.collect(candidate(reader, 0, "b", Some(0.5)));
        let (states, stats) = collector.finish(&index, &order);

        assert_eq!(stats.len(), 1);
        let state = states.get(&0).unwrap();
        assert_eq!(state.scored_states.len(), 1);
        assert_eq!(state.unscored_docs.len(), 1);
    }

    #[test]
    fn test_all_terms_collector_admits_everything() {
        let seg = segment(&["a", "b", "c"]);
        let reader = seg.field("f").unwrap();
        let index = Index::new(Vec::new());
        let order = Order::prepare(vec![Box::new(crate::search::BoostSort)]);

        let mut collector = AllTermsCollector::new();
        collector.prepare(0, &seg, reader);
        for term in ["a", "b", "c"] {
            collector.collect(candidate(reader, 0, term, Some(1.0)));
        }
        let (states, stats) = collector.finish(&index, &order);
        assert_eq!(stats.len(), 3);
        assert_eq!(states.get(&0).unwrap().scored_states.len(), 3);
        assert!(states.get(&0).unwrap().unscored_docs.is_empty());
    }

    #[test]
    fn test_estimation_covers_scored_and_unscored() {
        let seg = segment(&["a", "b", "c"]);
        let reader = seg.field("f").unwrap();
        let index = Index::new(Vec::new());
        let order = Order::prepare(vec![Box::new(crate::search::BoostSort)]);

        let mut collector = LimitedSampleCollector::new(1);
        collector.prepare(0, &seg, reader);
        collector.collect(candidate(reader, 0, "a", Some(3.0)));
        collector.collect(candidate(reader, 0, "b", Some(2.0)));
        collector.collect(candidate(reader, 0, "c", Some(1.0)));
        let (states, _) = collector.finish(&index, &order);

        let state = states.get(&0).unwrap();
        assert_eq!(state.estimation(), 3); // 1 scored doc + 2 unscored docs
    }
}
