//! Boost sort: scores every document with the query boost

use super::sort::{FieldCollector, Scorer, Sort, TermCollector};
use crate::segment::{Index, SegmentReader, TermReader};

/// A sort bucket whose score is the effective boost of the matching
/// iterator. It collects no statistics at all.
pub struct BoostSort;

struct BoostScorer {
    boost: f32,
}

impl Scorer for BoostScorer {
    fn score(&mut self, _freq: u32) -> f32 {
        self.boost
    }
}

impl Sort for BoostSort {
    fn stats_size(&self) -> usize {
        0
    }

    fn prepare_field_collector(&self) -> Option<Box<dyn FieldCollector>> {
        None
    }

    fn prepare_term_collector(&self) -> Option<Box<dyn TermCollector>> {
        None
    }

    fn collect(
        &self,
        _stats: &mut [u8],
        _index: &Index,
        _field: Option<&dyn FieldCollector>,
        _term: Option<&dyn TermCollector>,
    ) {
    }

    fn prepare_scorer(
        &self,
        _segment: &SegmentReader,
        _field: Option<&TermReader>,
        _stats: &[u8],
        boost: f32,
    ) -> Box<dyn Scorer> {
        Box::new(BoostScorer { boost })
    }
}
