//! Segment layer: per-field term dictionaries and posting lists
//!
//! A segment is an immutable unit of the index. Each field of a segment has
//! its own FST-backed term dictionary mapping terms to posting-list
//! metadata; posting lists are block encoded with a trailing block
//! directory that `seek` binary-searches. Segments here live in memory; a
//! codec-backed layer would expose the same interfaces.

mod postings;
mod reader;
mod term_dict;
mod types;
mod writer;

pub use postings::{DocIterator, EmptyDocIterator, PostingIterator, PostingsReader, PostingsWriter};
pub use reader::{Index, SegmentMeta, SegmentReader, TermReader};
pub use term_dict::{
    AcceptorTermIterator, TermCookie, TermDictionary, TermDictionaryBuilder, TermIterator,
};
pub use types::{DocId, Posting, SegmentId, TermInfo};
pub use writer::SegmentWriter;
