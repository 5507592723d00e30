//! Sort buckets, prepared orders and the scorer protocol
//!
//! A [`Sort`] is one component of a query's ordering: it contributes a
//! field-level collector, a term-level collector, an opaque statistics
//! region of `stats_size` bytes, and a scorer fed from that region. An
//! [`Order`] is a prepared list of buckets with fixed stats offsets; scores
//! are written as one `f32` slot per bucket and merged across iterators
//! under a [`MergeType`].

use std::any::Any;

use crate::segment::{Index, SegmentReader, TermReader};

/// How scores of contributing iterators are merged per bucket slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeType {
    Sum,
    #[default]
    Max,
    Min,
    /// Keep the first contributor's score
    Noop,
}

impl MergeType {
    /// Fold `value` into `acc`; `first` marks the first contributor.
    pub fn merge(self, acc: &mut f32, value: f32, first: bool) {
        if first {
            *acc = value;
            return;
        }
        match self {
            MergeType::Sum => *acc += value,
            MergeType::Max => *acc = acc.max(value),
            MergeType::Min => *acc = acc.min(value),
            MergeType::Noop => {}
        }
    }
}

/// Statistics of one visited term, as seen by term collectors
#[derive(Clone, Copy, Debug, Default)]
pub struct TermStats {
    pub docs_count: u32,
    pub total_term_frequency: u64,
    /// Accepting-state payload of the matching acceptor, when present
    pub payload: Option<u8>,
}

/// Collects field-level statistics, one instance per bucket
pub trait FieldCollector: Send {
    fn collect(&mut self, segment: &SegmentReader, field: &TermReader);
    fn as_any(&self) -> &dyn Any;
}

/// Collects term-level statistics, one instance per (term, bucket)
pub trait TermCollector: Send {
    fn collect(&mut self, segment: &SegmentReader, field: &TermReader, stats: &TermStats);
    fn as_any(&self) -> &dyn Any;
}

/// Computes a document score from the current term frequency
pub trait Scorer: Send {
    fn score(&mut self, freq: u32) -> f32;
}

/// One component of a query ordering
pub trait Sort: Send + Sync {
    /// Size in bytes of this bucket's statistics region
    fn stats_size(&self) -> usize;

    /// Field-level collector, or `None` when the bucket needs none
    fn prepare_field_collector(&self) -> Option<Box<dyn FieldCollector>>;

    /// Term-level collector, or `None` when the bucket needs none
    fn prepare_term_collector(&self) -> Option<Box<dyn TermCollector>>;

    /// Write the bucket's statistics into its region of the stats buffer
    fn collect(
        &self,
        stats: &mut [u8],
        index: &Index,
        field: Option<&dyn FieldCollector>,
        term: Option<&dyn TermCollector>,
    );

    /// Prepare a scorer fed from the bucket's statistics region
    fn prepare_scorer(
        &self,
        segment: &SegmentReader,
        field: Option<&TermReader>,
        stats: &[u8],
        boost: f32,
    ) -> Box<dyn Scorer>;
}

/// A sort bucket with its fixed offset into stats buffers
pub struct Bucket {
    pub sort: Box<dyn Sort>,
    pub stats_offset: usize,
}

/// A prepared ordering: buckets with assigned stats offsets
#[derive(Default)]
pub struct Order {
    buckets: Vec<Bucket>,
    stats_size: usize,
}

impl Order {
    /// Prepare an order from sort buckets, assigning stats offsets
    pub fn prepare(sorts: Vec<Box<dyn Sort>>) -> Self {
        let mut buckets = Vec::with_capacity(sorts.len());
        let mut offset = 0;
        for sort in sorts {
            let size = sort.stats_size();
            buckets.push(Bucket {
                sort,
                stats_offset: offset,
            });
            offset += size;
        }
        Self {
            buckets,
            stats_size: offset,
        }
    }

    /// An order with no buckets: nothing is collected or scored
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total stats buffer size across buckets
    pub fn stats_size(&self) -> usize {
        self.stats_size
    }

    /// Number of `f32` score slots a doc iterator writes
    pub fn score_size(&self) -> usize {
        self.buckets.len()
    }

    /// Prepare one scorer per bucket for an iterator over `segment`
    pub fn prepare_scorers(
        &self,
        segment: &SegmentReader,
        field: Option<&TermReader>,
        stats: &[u8],
        boost: f32,
    ) -> Scorers {
        let scorers = self
            .buckets
            .iter()
            .map(|b| {
                b.sort
                    .prepare_scorer(segment, field, self.bucket_stats(b, stats), boost)
            })
            .collect();
        Scorers { scorers }
    }

    fn bucket_stats<'a>(&self, bucket: &Bucket, stats: &'a [u8]) -> &'a [u8] {
        &stats[bucket.stats_offset..bucket.stats_offset + bucket.sort.stats_size()]
    }
}

/// Prepared scorers of one doc iterator, one per bucket
pub struct Scorers {
    scorers: Vec<Box<dyn Scorer>>,
}

impl Scorers {
    /// Shared no-op for unordered queries
    pub fn none() -> Self {
        Self {
            scorers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    /// Write one score per bucket into `scores`
    pub fn score_into(&mut self, freq: u32, scores: &mut [f32]) {
        for (slot, scorer) in scores.iter_mut().zip(self.scorers.iter_mut()) {
            *slot = scorer.score(freq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::BoostSort;

    #[test]
    fn test_merge_types() {
        for (merge, expected) in [
            (MergeType::Sum, 3.0),
            (MergeType::Max, 2.0),
            (MergeType::Min, 1.0),
            (MergeType::Noop, 1.0),
        ] {
            let mut acc = 0.0;
            merge.merge(&mut acc, 1.0, true);
            merge.merge(&mut acc, 2.0, false);
            assert_eq!(acc, expected, "{:?}", merge);
        }
    }

    #[test]
    fn test_empty_order() {
        let order = Order::empty();
        assert!(order.is_empty());
        assert_eq!(order.stats_size(), 0);
        assert_eq!(order.score_size(), 0);
    }

    #[test]
    fn test_offsets_assigned_in_bucket_order() {
        let order = Order::prepare(vec![Box::new(BoostSort), Box::new(BoostSort)]);
        assert_eq!(order.len(), 2);
        assert_eq!(order.buckets()[0].stats_offset, 0);
        assert_eq!(order.buckets()[1].stats_offset, 0); // boost has no stats
        assert_eq!(order.stats_size(), 0);
    }
}
