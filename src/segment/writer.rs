//! In-memory segment construction
//!
//! Documents are added field by field; text fields run through an analyzer,
//! raw terms can be indexed directly. `build` freezes per-field term
//! dictionaries and posting lists into an immutable [`SegmentReader`].

use std::collections::{BTreeMap, HashMap};

use super::postings::{PostingsReader, PostingsWriter};
use super::reader::{SegmentMeta, SegmentReader, TermReader};
use super::term_dict::TermDictionaryBuilder;
use super::types::{DocId, Posting, SegmentId};
use crate::analysis::Analyzer;
use crate::error::{GristError, Result};

/// Accumulated postings for one field: term → (doc, term frequency) pairs
/// in document order
type FieldBuffer = BTreeMap<Vec<u8>, Vec<(u32, u32)>>;

/// Writer accumulating documents for a new segment
pub struct SegmentWriter {
    id: SegmentId,
    next_doc: u32,
    fields: HashMap<String, FieldBuffer>,
}

impl SegmentWriter {
    pub fn new(id: SegmentId) -> Self {
        Self {
            id,
            next_doc: 0,
            fields: HashMap::new(),
        }
    }

    /// Start a new document and return its id
    pub fn begin_document(&mut self) -> DocId {
        let doc = DocId::new(self.next_doc);
        self.next_doc += 1;
        doc
    }

    /// Number of documents started so far
    pub fn doc_count(&self) -> u32 {
        self.next_doc
    }

    /// Index one raw term into the current document's field
    pub fn index_term(&mut self, field: &str, term: &[u8]) {
        debug_assert!(self.next_doc > 0, "index_term before begin_document");
        let doc = self.next_doc - 1;
        let postings = self
            .fields
            .entry(field.to_string())
            .or_default()
            .entry(term.to_vec())
            .or_default();
        match postings.last_mut() {
            Some((last_doc, tf)) if *last_doc == doc => *tf += 1,
            _ => postings.push((doc, 1)),
        }
    }

    /// Analyze `text` and index the produced terms into the current
    /// document's field
    pub fn index_text(
        &mut self,
        field: &str,
        text: &str,
        analyzer: &mut dyn Analyzer,
    ) -> Result<()> {
        if !analyzer.reset(text) {
            return Err(GristError::Index(format!(
                "analyzer failed to reset on field '{}'",
                field
            )));
        }
        while analyzer.next() {
            let term = analyzer.attributes().term.clone();
            self.index_term(field, &term);
        }
        Ok(())
    }

    /// Freeze the accumulated documents into an immutable segment
    pub fn build(self) -> Result<SegmentReader> {
        let mut fields = HashMap::with_capacity(self.fields.len());

        for (name, buffer) in self.fields {
            let mut postings_writer = PostingsWriter::new();
            let mut dict_builder = TermDictionaryBuilder::with_capacity(buffer.len());

            for (term, postings) in buffer {
                postings_writer.start_posting_list();
                let mut total_tf = 0u64;
                for &(doc, tf) in &postings {
                    postings_writer.add_posting(Posting::new(DocId::new(doc), tf));
                    total_tf += tf as u64;
                }
                let info = postings_writer.finish_posting_list(postings.len() as u32, total_tf);
                dict_builder.add(term, info);
            }

            let dict = dict_builder.build()?;
            let reader = TermReader::new(dict, PostingsReader::new(postings_writer.into_data()));
            fields.insert(name, reader);
        }

        let meta = SegmentMeta {
            id: self.id,
            doc_count: self.next_doc,
        };
        Ok(SegmentReader::new(meta, fields))
    }
}
