//! TF-IDF sort bucket
//!
//! The field collector accumulates the document count of every visited
//! (segment, field) pair; the term collector accumulates the term's document
//! frequency across segments. `collect` folds both into an inverse document
//! frequency written to the bucket's stats region, and the scorer multiplies
//! it with the per-document term frequency and the iterator boost.

use std::any::Any;

use super::sort::{FieldCollector, Scorer, Sort, TermCollector, TermStats};
use crate::segment::{Index, SegmentReader, TermReader};

/// TF-IDF scoring bucket
#[derive(Default)]
pub struct TfIdfSort;

impl TfIdfSort {
    pub fn new() -> Self {
        Self
    }

    /// IDF with the Robertson-Sparck-Jones formula
    fn idf(docs_with_field: u64, doc_frequency: u64) -> f32 {
        let n = docs_with_field.max(doc_frequency) as f32;
        let df = doc_frequency as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

#[derive(Default)]
struct FieldDocsCollector {
    /// Documents in segments that carry the field
    docs_with_field: u64,
}

impl FieldCollector for FieldDocsCollector {
    fn collect(&mut self, segment: &SegmentReader, _field: &TermReader) {
        self.docs_with_field += segment.doc_count() as u64;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct DocFrequencyCollector {
    doc_frequency: u64,
}

impl TermCollector for DocFrequencyCollector {
    fn collect(&mut self, _segment: &SegmentReader, _field: &TermReader, stats: &TermStats) {
        self.doc_frequency += stats.docs_count as u64;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct TfIdfScorer {
    idf: f32,
    boost: f32,
}

impl Scorer for TfIdfScorer {
    fn score(&mut self, freq: u32) -> f32 {
        self.idf * freq as f32 * self.boost
    }
}

impl Sort for TfIdfSort {
    fn stats_size(&self) -> usize {
        std::mem::size_of::<f32>()
    }

    fn prepare_field_collector(&self) -> Option<Box<dyn FieldCollector>> {
        Some(Box::<FieldDocsCollector>::default())
    }

    fn prepare_term_collector(&self) -> Option<Box<dyn TermCollector>> {
        Some(Box::<DocFrequencyCollector>::default())
    }

    fn collect(
        &self,
        stats: &mut [u8],
        _index: &Index,
        field: Option<&dyn FieldCollector>,
        term: Option<&dyn TermCollector>,
    ) {
        let docs_with_field = field
            .and_then(|c| c.as_any().downcast_ref::<FieldDocsCollector>())
            .map(|c| c.docs_with_field)
            .unwrap_or(0);
        let doc_frequency = term
            .and_then(|c| c.as_any().downcast_ref::<DocFrequencyCollector>())
            .map(|c| c.doc_frequency)
            .unwrap_or(0);

        let idf = Self::idf(docs_with_field, doc_frequency);
        stats[..4].copy_from_slice(&idf.to_le_bytes());
    }

    fn prepare_scorer(
        &self,
        _segment: &SegmentReader,
        _field: Option<&TermReader>,
        stats: &[u8],
        boost: f32,
    ) -> Box<dyn Scorer> {
        debug_assert!(stats.len() >= 4);
        let idf = f32::from_le_bytes(stats[..4].try_into().unwrap_or([0; 4]));
        Box::new(TfIdfScorer { idf, boost })
    }
}
