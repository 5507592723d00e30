//! Core types for the segment-based index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment identifier (monotonically increasing per index)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document identifier within a segment (0..doc_count)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    /// Sentinel for "not positioned yet"; `seek(INVALID)` is a no-op
    pub const INVALID: DocId = DocId(u32::MAX);
    /// Sentinel for "exhausted"; `seek(EOF)` exhausts the iterator
    pub const EOF: DocId = DocId(u32::MAX - 1);

    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// A real document id, not a sentinel
    pub fn is_valid(self) -> bool {
        self.0 < Self::EOF.0
    }
}

/// A single posting entry within a posting list
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Document within the segment
    pub doc: DocId,
    /// Term frequency in this document
    pub term_frequency: u32,
}

impl Posting {
    pub fn new(doc: DocId, term_frequency: u32) -> Self {
        Self {
            doc,
            term_frequency,
        }
    }
}

/// Per-term metadata stored in the term dictionary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    /// Offset of the posting list in the postings data
    pub offset: u64,
    /// Length of the posting list in bytes
    pub length: u64,
    /// Number of documents containing this term
    pub docs_count: u32,
    /// Total term frequency across all documents
    pub total_term_frequency: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_id() {
        let id = SegmentId::new(42);
        assert_eq!(id.0, 42);
        assert_eq!(id.next().0, 43);
        assert_eq!(format!("{}", id), "segment_42");
    }

    #[test]
    fn test_doc_id_sentinels() {
        assert!(DocId::new(0).is_valid());
        assert!(DocId::new(1000).is_valid());
        assert!(!DocId::EOF.is_valid());
        assert!(!DocId::INVALID.is_valid());
        assert!(DocId::EOF < DocId::INVALID);
    }

    #[test]
    fn test_posting() {
        let posting = Posting::new(DocId(7), 3);
        assert_eq!(posting.doc, DocId(7));
        assert_eq!(posting.term_frequency, 3);
    }
}
