//! Field- and term-collector fan-out containers
//!
//! The containers substitute "no collector" with `Option::None` so the
//! fan-out call sites stay branch-poor; the common bucket counts 0, 1 and 2
//! get dedicated paths.

use super::sort::{FieldCollector, Order, TermCollector, TermStats};
use crate::segment::{Index, SegmentReader, TermReader};

/// One field collector per bucket
pub struct FieldCollectors {
    collectors: Vec<Option<Box<dyn FieldCollector>>>,
}

impl FieldCollectors {
    pub fn new(order: &Order) -> Self {
        Self {
            collectors: order
                .buckets()
                .iter()
                .map(|b| b.sort.prepare_field_collector())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Fan out one visited field to every bucket's collector
    pub fn collect(&mut self, segment: &SegmentReader, field: &TermReader) {
        match self.collectors.as_mut_slice() {
            [] => {}
            [only] => {
                if let Some(collector) = only {
                    collector.collect(segment, field);
                }
            }
            [first, second] => {
                if let Some(collector) = first {
                    collector.collect(segment, field);
                }
                if let Some(collector) = second {
                    collector.collect(segment, field);
                }
            }
            rest => {
                for collector in rest.iter_mut().flatten() {
                    collector.collect(segment, field);
                }
            }
        }
    }

    /// Collector of one bucket
    pub fn get(&self, bucket: usize) -> Option<&dyn FieldCollector> {
        self.collectors
            .get(bucket)
            .and_then(|c| c.as_deref())
    }

    /// Write every bucket's stats with field-level statistics only
    /// (term statistics collection does not apply, e.g. field-existence
    /// style filters)
    pub fn finish(&self, stats: &mut [u8], index: &Index, order: &Order) {
        debug_assert_eq!(self.collectors.len(), order.len());
        for (bucket, collector) in order.buckets().iter().zip(&self.collectors) {
            let region =
                &mut stats[bucket.stats_offset..bucket.stats_offset + bucket.sort.stats_size()];
            bucket.sort.collect(region, index, collector.as_deref(), None);
        }
    }
}

/// `bucket_count × term_count` term collectors in row-major layout
/// `[t0b0, t0b1, …, t0bN, t1b0, …]`
pub struct TermCollectors {
    collectors: Vec<Option<Box<dyn TermCollector>>>,
    bucket_count: usize,
}

impl TermCollectors {
    pub fn new(order: &Order, terms: usize) -> Self {
        let bucket_count = order.len();
        let mut collectors = Vec::with_capacity(bucket_count * terms);
        for _ in 0..terms {
            for bucket in order.buckets() {
                collectors.push(bucket.sort.prepare_term_collector());
            }
        }
        Self {
            collectors,
            bucket_count,
        }
    }

    /// Number of term rows
    pub fn rows(&self) -> usize {
        if self.bucket_count == 0 {
            0
        } else {
            self.collectors.len() / self.bucket_count
        }
    }

    /// Append one term row; returns the new row's index
    pub fn push_back(&mut self, order: &Order) -> usize {
        debug_assert_eq!(order.len(), self.bucket_count);
        match self.bucket_count {
            0 => 0,
            1 => {
                let row = self.collectors.len();
                self.collectors
                    .push(order.buckets()[0].sort.prepare_term_collector());
                row
            }
            2 => {
                let row = self.collectors.len() / 2;
                self.collectors
                    .push(order.buckets()[0].sort.prepare_term_collector());
                self.collectors
                    .push(order.buckets()[1].sort.prepare_term_collector());
                row
            }
            count => {
                let row = self.collectors.len() / count;
                self.collectors.reserve(count);
                for bucket in order.buckets() {
                    self.collectors.push(bucket.sort.prepare_term_collector());
                }
                row
            }
        }
    }

    /// Fan out one visited term to row `term_idx`
    pub fn collect(
        &mut self,
        segment: &SegmentReader,
        field: &TermReader,
        term_idx: usize,
        stats: &TermStats,
    ) {
        match self.bucket_count {
            0 => {}
            1 => {
                debug_assert!(term_idx < self.collectors.len());
                if let Some(collector) = &mut self.collectors[term_idx] {
                    collector.collect(segment, field, stats);
                }
            }
            2 => {
                let base = term_idx * 2;
                debug_assert!(base + 1 < self.collectors.len());
                if let Some(collector) = &mut self.collectors[base] {
                    collector.collect(segment, field, stats);
                }
                if let Some(collector) = &mut self.collectors[base + 1] {
                    collector.collect(segment, field, stats);
                }
            }
            count => {
                let base = term_idx * count;
                for i in 0..count {
                    debug_assert!(base + i < self.collectors.len());
                    if let Some(collector) = &mut self.collectors[base + i] {
                        collector.collect(segment, field, stats);
                    }
                }
            }
        }
    }

    /// Write one term row's stats into `stats`, using the corresponding
    /// field collectors
    pub fn finish_row(
        &self,
        row: usize,
        stats: &mut [u8],
        field: &FieldCollectors,
        index: &Index,
        order: &Order,
    ) {
        debug_assert_eq!(order.len(), self.bucket_count);
        for (bucket_idx, bucket) in order.buckets().iter().enumerate() {
            let collector = self.collectors[row * self.bucket_count + bucket_idx].as_deref();
            let region =
                &mut stats[bucket.stats_offset..bucket.stats_offset + bucket.sort.stats_size()];
            bucket
                .sort
                .collect(region, index, field.get(bucket_idx), collector);
        }
    }

    /// Write every row into `stats`, row-major
    pub fn finish(&self, stats: &mut [u8], field: &FieldCollectors, index: &Index, order: &Order) {
        for row in 0..self.rows() {
            self.finish_row(row, stats, field, index, order);
        }
    }
}
