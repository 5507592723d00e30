//! Prepared multi-term queries

use std::collections::HashMap;
use std::sync::Arc;

use roaring::RoaringBitmap;
use tracing::{debug, warn};

use super::doc_iterator::{BitsetDocIterator, Disjunction, ScoredDocIterator};
use super::filter::{empty_query, Cancellation, PrepareContext, PreparedQuery};
use super::sample::{AllTermsCollector, LimitedSampleCollector, TermCandidate};
use super::sort::{MergeType, Order};
use crate::automaton::Acceptor;
use crate::segment::{AcceptorTermIterator, DocIterator, EmptyDocIterator, SegmentReader, TermCookie};

/// Per-segment outcome of a multi-term preparation
#[derive(Default)]
pub struct SegmentState {
    /// Scored terms: (cookie, offset into the stats buffers, term boost)
    pub scored_states: Vec<(TermCookie, usize, f32)>,
    /// Matching documents of terms skipped by the top-K cut; the
    /// disjunction still emits them, with the neutral score
    pub unscored_docs: RoaringBitmap,
    /// Estimated document count of the scored states
    pub scored_states_estimation: u64,
}

impl SegmentState {
    /// Total cost of executing this segment's state
    pub fn estimation(&self) -> u64 {
        self.scored_states_estimation + self.unscored_docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scored_states.is_empty() && self.unscored_docs.is_empty()
    }
}

/// Prepared disjunction over the terms accepted per segment.
///
/// Immutable after preparation; cookies are resolved against the producing
/// segment at execution time, and a state whose re-seek fails is skipped
/// silently rather than aborting the query.
pub struct MultiTermQuery {
    field: String,
    states: HashMap<usize, SegmentState>,
    stats: Vec<Vec<u8>>,
    boost: f32,
    merge_type: MergeType,
    order: Arc<Order>,
    cancel: Option<Arc<Cancellation>>,
}

impl MultiTermQuery {
    pub fn new(
        field: String,
        states: HashMap<usize, SegmentState>,
        stats: Vec<Vec<u8>>,
        boost: f32,
        merge_type: MergeType,
        order: Arc<Order>,
        cancel: Option<Arc<Cancellation>>,
    ) -> Self {
        Self {
            field,
            states,
            stats,
            boost,
            merge_type,
            order,
            cancel,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn merge_type(&self) -> MergeType {
        self.merge_type
    }

    /// Stats buffers of the scored terms, one per term
    pub fn stats(&self) -> &[Vec<u8>] {
        &self.stats
    }

    /// State prepared for segment ordinal `ord`, if any
    pub fn state(&self, ord: usize) -> Option<&SegmentState> {
        self.states.get(&ord)
    }
}

impl PreparedQuery for MultiTermQuery {
    fn boost(&self) -> f32 {
        self.boost
    }

    fn execute<'a>(
        &'a self,
        segment: &'a SegmentReader,
        ord: usize,
    ) -> Box<dyn DocIterator + 'a> {
        let Some(state) = self.states.get(&ord) else {
            return Box::new(EmptyDocIterator::default());
        };
        let Some(reader) = segment.field(&self.field) else {
            return Box::new(EmptyDocIterator::default());
        };

        let mut scored = Vec::with_capacity(state.scored_states.len());
        for (cookie, stat_offset, term_boost) in &state.scored_states {
            let Some(info) = reader.seek_cookie(cookie) else {
                debug!("stale term cookie at execution; skipping state");
                continue;
            };
            let postings = match reader.postings(info) {
                Ok(postings) => postings,
                Err(e) => {
                    warn!(error = %e, "abandoning scored state with unreadable postings");
                    continue;
                }
            };
            let scorers = self.order.prepare_scorers(
                segment,
                Some(reader),
                &self.stats[*stat_offset],
                self.boost * term_boost,
            );
            scored.push(ScoredDocIterator::new(postings, scorers));
        }

        let mut neutral: Vec<Box<dyn DocIterator + 'a>> = Vec::new();
        if !state.unscored_docs.is_empty() {
            neutral.push(Box::new(BitsetDocIterator::new(&state.unscored_docs)));
        }

        if scored.is_empty() && neutral.is_empty() {
            return Box::new(EmptyDocIterator::default());
        }
        Box::new(Disjunction::new(
            scored,
            neutral,
            self.merge_type,
            self.order.score_size(),
            self.cancel.clone(),
        ))
    }
}

/// Drive `acceptor` over every segment's field terms, collect the top-K
/// sample and produce the prepared multi-term query. `key_of` maps one
/// accepted term to its `(ranking key, term boost)`; a `None` key marks the
/// term as matching-but-unscored.
///
/// Degrades to the empty query when the acceptor fails validation.
pub(crate) fn prepare_automaton_filter<F>(
    ctx: &PrepareContext<'_>,
    field: &str,
    acceptor: &Acceptor,
    scored_terms_limit: Option<usize>,
    key_of: F,
) -> Box<dyn PreparedQuery>
where
    F: Fn(&AcceptorTermIterator<'_>) -> (Option<f32>, f32),
{
    if !acceptor.validate() {
        warn!(field, "expected a deterministic, epsilon-free acceptor; yielding no documents");
        return empty_query();
    }

    // nothing is scored without an order, whatever the requested limit
    let limit = if ctx.order.is_empty() {
        Some(0)
    } else {
        scored_terms_limit
    };

    enum Collector<'a> {
        Limited(LimitedSampleCollector<'a>),
        All(AllTermsCollector<'a>),
    }

    let mut collector = match limit {
        Some(limit) => Collector::Limited(LimitedSampleCollector::new(limit)),
        None => Collector::All(AllTermsCollector::new()),
    };

    for (ord, segment) in ctx.index.segments().iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        let Some(reader) = segment.field(field) else {
            continue;
        };

        let mut it = reader.iterator_matching(acceptor);
        let mut prepared = false;
        while it.next() {
            if !prepared {
                match &mut collector {
                    Collector::Limited(c) => c.prepare(ord, segment, reader),
                    Collector::All(c) => c.prepare(ord, segment, reader),
                }
                prepared = true;
            }
            let (key, boost) = key_of(&it);
            let candidate = TermCandidate {
                segment_ord: ord,
                term: it.value().to_vec(),
                docs_count: it.docs_count(),
                total_term_frequency: it.info().total_term_frequency,
                payload: it.payload(),
                cookie: it.cookie(),
                key,
                boost,
            };
            match &mut collector {
                Collector::Limited(c) => c.collect(candidate),
                Collector::All(c) => c.collect(candidate),
            }
        }
    }

    let (states, stats) = match collector {
        Collector::Limited(c) => c.finish(ctx.index, &ctx.order),
        Collector::All(c) => c.finish(ctx.index, &ctx.order),
    };

    Box::new(MultiTermQuery::new(
        field.to_string(),
        states,
        stats,
        ctx.boost,
        MergeType::Max,
        ctx.order.clone(),
        ctx.cancel.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filter::PrepareContext;
    use crate::search::BoostSort;
    use crate::segment::{Index, SegmentId, SegmentWriter};

    fn index(segments: &[&[&str]]) -> Index {
        let readers = segments
            .iter()
            .enumerate()
            .map(|(i, terms)| {
                let mut writer = SegmentWriter::new(SegmentId::new(i as u64));
                for term in *terms {
                    writer.begin_document();
                    writer.index_term("f", term.as_bytes());
                }
                writer.build().unwrap()
            })
            .collect();
        Index::new(readers)
    }

    fn drain<'a>(query: &'a dyn PreparedQuery, index: &'a Index) -> Vec<(usize, u32)> {
        let mut docs = Vec::new();
        for (ord, segment) in index.segments().iter().enumerate() {
            let mut iter = query.execute(segment, ord);
            while iter.next() {
                docs.push((ord, iter.doc().as_u32()));
            }
        }
        docs
    }

    #[test]
    fn test_prefix_acceptor_across_segments() {
        let index = index(&[&["foo", "foobar", "bar"], &["food", "xfoo"]]);
        let order = Arc::new(Order::prepare(vec![Box::new(BoostSort)]));
        let ctx = PrepareContext::new(&index, order);

        let acceptor = Acceptor::prefix(b"foo");
        let query = prepare_automaton_filter(&ctx, "f", &acceptor, Some(64), |it| {
            (Some(it.docs_count() as f32), 1.0)
        });

        let docs = drain(query.as_ref(), &index);
        assert_eq!(docs, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_missing_field_contributes_nothing() {
        let index = index(&[&["foo"]]);
        let ctx = PrepareContext::unordered(&index);
        let acceptor = Acceptor::prefix(b"foo");
        let query = prepare_automaton_filter(&ctx, "absent", &acceptor, Some(64), |_| {
            (Some(1.0), 1.0)
        });
        assert!(drain(query.as_ref(), &index).is_empty());
    }

    #[test]
    fn test_empty_order_yields_unscored_matches() {
        let index = index(&[&["foo", "foobar"]]);
        let ctx = PrepareContext::unordered(&index);
        let acceptor = Acceptor::prefix(b"foo");
        let query = prepare_automaton_filter(&ctx, "f", &acceptor, Some(64), |it| {
            (Some(it.docs_count() as f32), 1.0)
        });

        // everything matched, nothing scored
        let docs = drain(query.as_ref(), &index);
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_cancelled_preparation_is_consistent() {
        let index = index(&[&["foo"], &["foobar"]]);
        let cancel = Arc::new(Cancellation::new());
        cancel.cancel();
        let ctx = PrepareContext::unordered(&index).with_cancellation(cancel);
        let acceptor = Acceptor::prefix(b"foo");
        let query = prepare_automaton_filter(&ctx, "f", &acceptor, Some(64), |_| {
            (Some(1.0), 1.0)
        });
        // cancelled before the first segment: an empty but usable query
        assert!(drain(query.as_ref(), &index).is_empty());
    }
}
