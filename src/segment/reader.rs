//! Immutable segment readers and the index view over them

use std::collections::HashMap;
use std::io;

use super::postings::{PostingIterator, PostingsReader};
use super::term_dict::{AcceptorTermIterator, TermCookie, TermDictionary, TermIterator};
use super::types::{SegmentId, TermInfo};
use crate::automaton::Acceptor;

/// Metadata for a segment
#[derive(Clone, Debug)]
pub struct SegmentMeta {
    /// Unique segment identifier
    pub id: SegmentId,
    /// Number of documents in the segment
    pub doc_count: u32,
}

/// Per-segment, per-field view over a term dictionary and its postings
pub struct TermReader {
    dict: TermDictionary,
    postings: PostingsReader,
}

impl TermReader {
    pub fn new(dict: TermDictionary, postings: PostingsReader) -> Self {
        Self { dict, postings }
    }

    /// Sorted iterator over the field's terms
    pub fn iterator(&self) -> TermIterator<'_> {
        self.dict.iter()
    }

    /// Iterator over the terms accepted by `acceptor`
    pub fn iterator_matching<'a>(&'a self, acceptor: &'a Acceptor) -> AcceptorTermIterator<'a> {
        self.dict.search(acceptor)
    }

    /// Exact term lookup
    pub fn get(&self, term: &[u8]) -> Option<(u64, &TermInfo)> {
        self.dict.get(term)
    }

    /// Re-seek a previously seen term by cookie
    pub fn seek_cookie(&self, cookie: &TermCookie) -> Option<&TermInfo> {
        self.dict.seek_cookie(cookie)
    }

    /// Doc iterator over the posting list described by `info`
    pub fn postings(&self, info: &TermInfo) -> io::Result<PostingIterator<'_>> {
        self.postings.postings(info)
    }

    /// Number of unique terms in the field
    pub fn term_count(&self) -> usize {
        self.dict.len()
    }
}

/// Immutable reader over one segment's fields
pub struct SegmentReader {
    meta: SegmentMeta,
    fields: HashMap<String, TermReader>,
}

impl SegmentReader {
    pub fn new(meta: SegmentMeta, fields: HashMap<String, TermReader>) -> Self {
        Self { meta, fields }
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    /// Term reader for a field, if the segment has it
    pub fn field(&self, name: &str) -> Option<&TermReader> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// An index is an ordered list of segments; queries address segments by
/// their ordinal within it.
#[derive(Default)]
pub struct Index {
    segments: Vec<SegmentReader>,
}

impl Index {
    pub fn new(segments: Vec<SegmentReader>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[SegmentReader] {
        &self.segments
    }

    pub fn segment(&self, ord: usize) -> Option<&SegmentReader> {
        self.segments.get(ord)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of documents across segments
    pub fn doc_count(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::writer::SegmentWriter;
    use crate::segment::{DocId, SegmentId};

    /// One document per entry, fields filled with raw terms
    fn segment_with_terms(docs: &[(&str, &[&str])]) -> SegmentReader {
        let mut writer = SegmentWriter::new(SegmentId::new(1));
        for (field, terms) in docs {
            writer.begin_document();
            for term in *terms {
                writer.index_term(field, term.as_bytes());
            }
        }
        writer.build().unwrap()
    }

    #[test]
    fn test_field_lookup() {
        let segment = segment_with_terms(&[("title", &["hello", "world"])]);
        assert!(segment.field("title").is_some());
        assert!(segment.field("body").is_none());
    }

    #[test]
    fn test_term_reader_roundtrip() {
        let segment = segment_with_terms(&[("title", &["hello", "world"]), ("title", &["hello"])]);
        let reader = segment.field("title").unwrap();
        assert_eq!(reader.term_count(), 2);

        let (_, info) = reader.get(b"hello").unwrap();
        assert_eq!(info.docs_count, 2);

        let mut postings = reader.postings(info).unwrap();
        use crate::segment::DocIterator;
        assert!(postings.next());
        assert_eq!(postings.doc(), DocId(0));
        assert!(postings.next());
        assert_eq!(postings.doc(), DocId(1));
        assert!(!postings.next());
    }

    #[test]
    fn test_index_doc_count() {
        let a = segment_with_terms(&[("f", &["x"])]);
        let b = segment_with_terms(&[("f", &["y"]), ("f", &["z"])]);
        let index = Index::new(vec![a, b]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.doc_count(), 3);
        assert!(index.segment(0).is_some());
        assert!(index.segment(2).is_none());
    }
}
