//! Term dictionary using FST (Finite State Transducer)
//!
//! Maps terms to per-term metadata through an `fst::Map` whose values are
//! ordinals into a parallel metadata array. Lookups are O(|term|), sorted
//! iteration is a stream, and automaton-driven iteration intersects the FST
//! with an [`Acceptor`] so whole subtrees without a productive acceptor
//! state are skipped.

use fst::{IntoStreamer, Map, MapBuilder, Streamer};

use super::types::TermInfo;
use crate::automaton::Acceptor;
use crate::error::Result;

/// Opaque handle re-seeking a term iterator to an exact term without a
/// rescan. Valid only against the segment that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermCookie {
    ordinal: u64,
    term: Vec<u8>,
}

impl TermCookie {
    pub fn term(&self) -> &[u8] {
        &self.term
    }
}

/// Term dictionary backed by FST
pub struct TermDictionary {
    /// FST mapping term → ordinal into `infos`
    fst: Map<Vec<u8>>,
    /// Metadata for each term (parallel to FST output values)
    infos: Vec<TermInfo>,
}

impl TermDictionary {
    /// Create a term dictionary from FST data and metadata
    pub fn new(fst_data: Vec<u8>, infos: Vec<TermInfo>) -> Result<Self> {
        let fst = Map::new(fst_data)?;
        Ok(Self { fst, infos })
    }

    /// Look up a term and return its ordinal and metadata
    pub fn get(&self, term: &[u8]) -> Option<(u64, &TermInfo)> {
        self.fst
            .get(term)
            .map(|ordinal| (ordinal, &self.infos[ordinal as usize]))
    }

    /// Metadata for a term ordinal
    pub fn info(&self, ordinal: u64) -> Option<&TermInfo> {
        self.infos.get(ordinal as usize)
    }

    /// Re-seek by cookie. Returns `None` when the cookie does not match
    /// this dictionary (e.g. it came from another segment).
    pub fn seek_cookie(&self, cookie: &TermCookie) -> Option<&TermInfo> {
        match self.fst.get(&cookie.term) {
            Some(ordinal) if ordinal == cookie.ordinal => self.infos.get(ordinal as usize),
            _ => None,
        }
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Sorted iterator over all terms
    pub fn iter(&self) -> TermIterator<'_> {
        TermIterator {
            dict: self,
            stream: self.fst.stream(),
            term: Vec::new(),
            ordinal: 0,
            positioned: false,
        }
    }

    /// Iterator over the terms accepted by `acceptor`, in sorted order
    pub fn search<'a>(&'a self, acceptor: &'a Acceptor) -> AcceptorTermIterator<'a> {
        AcceptorTermIterator {
            dict: self,
            acceptor,
            stream: self.fst.search_with_state(acceptor).into_stream(),
            term: Vec::new(),
            ordinal: 0,
            payload: None,
            positioned: false,
        }
    }

}

/// Seekable sorted iterator over a dictionary's terms
pub struct TermIterator<'a> {
    dict: &'a TermDictionary,
    stream: fst::map::Stream<'a>,
    term: Vec<u8>,
    ordinal: u64,
    positioned: bool,
}

impl TermIterator<'_> {
    /// Advance to the next term
    pub fn next(&mut self) -> bool {
        match self.stream.next() {
            Some((term, ordinal)) => {
                self.term.clear();
                self.term.extend_from_slice(term);
                self.ordinal = ordinal;
                self.positioned = true;
                true
            }
            None => {
                self.positioned = false;
                false
            }
        }
    }

    /// Position on the first term ≥ `target`; returns `false` when no such
    /// term exists
    pub fn seek(&mut self, target: &[u8]) -> bool {
        self.stream = self.dict.fst.range().ge(target).into_stream();
        self.next()
    }

    /// Current term bytes
    pub fn value(&self) -> &[u8] {
        debug_assert!(self.positioned);
        &self.term
    }

    /// Document count of the current term
    pub fn docs_count(&self) -> u32 {
        self.info().docs_count
    }

    /// Metadata of the current term
    pub fn info(&self) -> &TermInfo {
        debug_assert!(self.positioned);
        &self.dict.infos[self.ordinal as usize]
    }

    /// Snapshot the current position
    pub fn cookie(&self) -> TermCookie {
        debug_assert!(self.positioned);
        TermCookie {
            ordinal: self.ordinal,
            term: self.term.clone(),
        }
    }
}

/// Iterator over the terms accepted by an acceptor, exposing the accepting
/// state's payload byte (for Levenshtein acceptors, the edit distance).
///
/// The iterator borrows the acceptor for its lifetime; there is no
/// ownership cycle between the two.
pub struct AcceptorTermIterator<'a> {
    dict: &'a TermDictionary,
    acceptor: &'a Acceptor,
    stream: fst::map::StreamWithState<'a, &'a Acceptor>,
    term: Vec<u8>,
    ordinal: u64,
    payload: Option<u8>,
    positioned: bool,
}

impl AcceptorTermIterator<'_> {
    /// Advance to the next accepted term
    pub fn next(&mut self) -> bool {
        match self.stream.next() {
            Some((term, ordinal, state)) => {
                self.term.clear();
                self.term.extend_from_slice(term);
                self.ordinal = ordinal;
                self.payload = state.and_then(|s| self.acceptor.payload(s));
                self.positioned = true;
                true
            }
            None => {
                self.positioned = false;
                false
            }
        }
    }

    /// Current term bytes
    pub fn value(&self) -> &[u8] {
        debug_assert!(self.positioned);
        &self.term
    }

    /// Document count of the current term
    pub fn docs_count(&self) -> u32 {
        self.info().docs_count
    }

    /// Metadata of the current term
    pub fn info(&self) -> &TermInfo {
        debug_assert!(self.positioned);
        &self.dict.infos[self.ordinal as usize]
    }

    /// Payload byte of the accepting state, if it carries one
    pub fn payload(&self) -> Option<u8> {
        self.payload
    }

    /// Snapshot the current position
    pub fn cookie(&self) -> TermCookie {
        debug_assert!(self.positioned);
        TermCookie {
            ordinal: self.ordinal,
            term: self.term.clone(),
        }
    }
}

/// Builder for term dictionaries
pub struct TermDictionaryBuilder {
    terms: Vec<(Vec<u8>, TermInfo)>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    /// Add a term with its metadata
    pub fn add(&mut self, term: Vec<u8>, info: TermInfo) {
        self.terms.push((term, info));
    }

    /// Build the term dictionary
    pub fn build(mut self) -> Result<TermDictionary> {
        // FST requires sorted input
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut fst_builder = MapBuilder::memory();
        let mut infos = Vec::with_capacity(self.terms.len());

        for (ordinal, (term, info)) in self.terms.into_iter().enumerate() {
            fst_builder.insert(&term, ordinal as u64)?;
            infos.push(info);
        }

        let fst_data = fst_builder.into_inner()?;
        TermDictionary::new(fst_data, infos)
    }
}

impl Default for TermDictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
