//! Exact-term filter

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::collectors::{FieldCollectors, TermCollectors};
use super::doc_iterator::ScoredDocIterator;
use super::filter::{Filter, PrepareContext, PreparedQuery};
use super::sort::{Order, TermStats};
use crate::segment::{DocIterator, EmptyDocIterator, SegmentReader, TermInfo};

fn default_boost() -> f32 {
    1.0
}

/// Filter matching one exact term in a field
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TermFilter {
    /// Field to search in
    pub field: String,
    /// Term to match
    pub term: String,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f32,
}

impl TermFilter {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl Filter for TermFilter {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Box<dyn PreparedQuery> {
        prepare_term(ctx, &self.field, self.term.as_bytes(), self.boost)
    }
}

/// Prepare an exact-term query; shared with filters that decay to one
/// (wildcards without wildcards, edit distance zero).
pub(crate) fn prepare_term(
    ctx: &PrepareContext<'_>,
    field: &str,
    term: &[u8],
    filter_boost: f32,
) -> Box<dyn PreparedQuery> {
    let mut field_collectors = FieldCollectors::new(&ctx.order);
    let mut term_collectors = TermCollectors::new(&ctx.order, 1);
    let mut states = HashMap::new();

    for (ord, segment) in ctx.index.segments().iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        let Some(reader) = segment.field(field) else {
            continue;
        };
        let Some((_, info)) = reader.get(term) else {
            continue;
        };

        field_collectors.collect(segment, reader);
        term_collectors.collect(
            segment,
            reader,
            0,
            &TermStats {
                docs_count: info.docs_count,
                total_term_frequency: info.total_term_frequency,
                payload: None,
            },
        );
        states.insert(ord, info.clone());
    }

    let mut stats = vec![0u8; ctx.order.stats_size()];
    term_collectors.finish(&mut stats, &field_collectors, ctx.index, &ctx.order);

    Box::new(TermQuery {
        field: field.to_string(),
        states,
        stats,
        boost: ctx.boost * filter_boost,
        order: ctx.order.clone(),
    })
}

/// Prepared exact-term query
pub struct TermQuery {
    field: String,
    states: HashMap<usize, TermInfo>,
    stats: Vec<u8>,
    boost: f32,
    order: Arc<Order>,
}

impl TermQuery {
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl PreparedQuery for TermQuery {
    fn boost(&self) -> f32 {
        self.boost
    }

    fn execute<'a>(
        &'a self,
        segment: &'a SegmentReader,
        ord: usize,
    ) -> Box<dyn DocIterator + 'a> {
        let Some(info) = self.states.get(&ord) else {
            return Box::new(EmptyDocIterator::default());
        };
        let Some(reader) = segment.field(&self.field) else {
            return Box::new(EmptyDocIterator::default());
        };
        let postings = match reader.postings(info) {
            Ok(postings) => postings,
            Err(e) => {
                warn!(error = %e, "abandoning term query segment with unreadable postings");
                return Box::new(EmptyDocIterator::default());
            }
        };
        let scorers = self
            .order
            .prepare_scorers(segment, Some(reader), &self.stats, self.boost);
        Box::new(ScoredDocIterator::new(postings, scorers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{BoostSort, Filter};
    use crate::segment::{Index, SegmentId, SegmentWriter};

    fn index() -> Index {
        let mut writer = SegmentWriter::new(SegmentId::new(0));
        writer.begin_document();
        writer.index_term("body", b"rust");
        writer.begin_document();
        writer.index_term("body", b"search");
        Index::new(vec![writer.build().unwrap()])
    }

    #[test]
    fn test_exact_match() {
        let index = index();
        let ctx = PrepareContext::unordered(&index);
        let query = TermFilter::new("body", "rust").prepare(&ctx);

        let mut iter = query.execute(&index.segments()[0], 0);
        assert!(iter.next());
        assert_eq!(iter.doc().as_u32(), 0);
        assert!(!iter.next());
    }

    #[test]
    fn test_missing_term() {
        let index = index();
        let ctx = PrepareContext::unordered(&index);
        let query = TermFilter::new("body", "absent").prepare(&ctx);
        let mut iter = query.execute(&index.segments()[0], 0);
        assert!(!iter.next());
    }

    #[test]
    fn test_boost_flows_into_scores() {
        let index = index();
        let order = Arc::new(Order::prepare(vec![Box::new(BoostSort)]));
        let ctx = PrepareContext::new(&index, order).with_boost(2.0);
        let query = TermFilter::new("body", "rust").with_boost(1.5).prepare(&ctx);
        assert_eq!(query.boost(), 3.0);

        let mut iter = query.execute(&index.segments()[0], 0);
        assert!(iter.next());
        let mut scores = [0.0f32];
        iter.score_into(&mut scores);
        assert_eq!(scores[0], 3.0);
    }
}
