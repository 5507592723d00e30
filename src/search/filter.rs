//! Filter preparation surface
//!
//! `Filter::prepare` is total: it always yields a usable prepared query,
//! possibly the empty one. Prepared queries are immutable and may be shared
//! across threads; the doc iterators they produce are single-owner cursors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::sort::Order;
use crate::segment::{DocIterator, EmptyDocIterator, Index, SegmentReader};

/// Cooperative cancellation flag, checked between segments during
/// preparation and between documents during execution.
#[derive(Default)]
pub struct Cancellation(AtomicBool);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything a filter needs to prepare itself
pub struct PrepareContext<'a> {
    pub index: &'a Index,
    pub order: Arc<Order>,
    pub boost: f32,
    pub cancel: Option<Arc<Cancellation>>,
}

impl<'a> PrepareContext<'a> {
    pub fn new(index: &'a Index, order: Arc<Order>) -> Self {
        Self {
            index,
            order,
            boost: 1.0,
            cancel: None,
        }
    }

    /// Context with no ordering: nothing is collected or scored
    pub fn unordered(index: &'a Index) -> Self {
        Self::new(index, Arc::new(Order::empty()))
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_cancellation(mut self, cancel: Arc<Cancellation>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// A user-level filter that can be prepared against an index
pub trait Filter {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Box<dyn PreparedQuery>;
}

/// An immutable prepared query
pub trait PreparedQuery: Send + Sync {
    fn boost(&self) -> f32 {
        1.0
    }

    /// Doc iterator over one segment; `ord` is the segment's ordinal within
    /// the index the query was prepared against
    fn execute<'a>(&'a self, segment: &'a SegmentReader, ord: usize)
        -> Box<dyn DocIterator + 'a>;
}

/// The prepared query matching nothing
pub struct EmptyQuery;

impl PreparedQuery for EmptyQuery {
    fn execute<'a>(
        &'a self,
        _segment: &'a SegmentReader,
        _ord: usize,
    ) -> Box<dyn DocIterator + 'a> {
        Box::new(EmptyDocIterator::default())
    }
}

/// Shorthand for degraded preparations
pub fn empty_query() -> Box<dyn PreparedQuery> {
    Box::new(EmptyQuery)
}
