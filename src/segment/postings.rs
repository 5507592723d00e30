//! Postings format
//!
//! A posting list is a run of fixed-capacity blocks followed by a block
//! directory and a one-word trailer:
//!
//! ```text
//! list      := block* directory trailer
//! block     := count:u8 doc_width:u8 freq_width:u8
//!              doc-deltas[count * doc_width]
//!              freqs[count * freq_width]        (absent when freq_width = 0)
//! directory := (last_doc:u32 offset:u32)*      (one entry per block)
//! trailer   := block_count:u32
//! ```
//!
//! Values are packed at the smallest whole-byte width that fits the block's
//! maximum: document ids as deltas against the previous document (the
//! previous block's last document at a block boundary), frequencies as
//! `freq - 1` so the common all-ones block needs no frequency bytes at all.
//! The trailing directory keeps entries fixed-width, which lets `seek`
//! binary-search for the first block that can contain its target instead of
//! walking a skip chain.

use std::io;

use super::types::{DocId, Posting, TermInfo};

/// Postings per block
const BLOCK_CAPACITY: usize = 64;
/// Bytes per directory entry: last document id + block offset
const DIRECTORY_ENTRY_BYTES: usize = 8;
/// Bytes of the block-count trailer
const TRAILER_BYTES: usize = 4;

/// Single-owner cursor over documents in strictly increasing id order.
///
/// State machine: unpositioned (`doc() == DocId::INVALID`) → positioned →
/// exhausted (`doc() == DocId::EOF`). `seek` only moves forward;
/// `seek(DocId::INVALID)` is a no-op and `seek(DocId::EOF)` exhausts.
pub trait DocIterator {
    /// Current document, or a sentinel
    fn doc(&self) -> DocId;

    /// Advance to the next document; `false` once exhausted
    fn next(&mut self) -> bool;

    /// Advance to the first document with id ≥ `target`; returns the new
    /// current document (possibly `DocId::EOF`)
    fn seek(&mut self, target: DocId) -> DocId;

    /// Estimated number of documents this iterator will emit
    fn cost(&self) -> u64;

    /// Term frequency at the current document, when the underlying source
    /// carries one
    fn freq(&self) -> u32 {
        1
    }

    /// Write the current document's bucket scores into `scores` (one slot
    /// per sort bucket). The unscored default leaves the buffer untouched,
    /// so "no scoring" costs nothing.
    fn score_into(&mut self, _scores: &mut [f32]) {}
}

/// Smallest whole-byte width that holds `value`; at least one byte
fn byte_width(value: u32) -> usize {
    ((32 - value.leading_zeros()).div_ceil(8) as usize).max(1)
}

fn write_packed(value: u32, width: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes()[..width]);
}

fn read_packed(data: &[u8], width: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes[..width].copy_from_slice(&data[..width]);
    u32::from_le_bytes(bytes)
}

/// Encode one block; returns the block's last document id
fn encode_block(prev_doc: u32, postings: &[Posting], out: &mut Vec<u8>) -> u32 {
    debug_assert!(!postings.is_empty() && postings.len() <= BLOCK_CAPACITY);

    let mut deltas = Vec::with_capacity(postings.len());
    let mut prev = prev_doc;
    for posting in postings {
        deltas.push(posting.doc.as_u32() - prev);
        prev = posting.doc.as_u32();
    }

    let doc_width = byte_width(deltas.iter().copied().max().unwrap_or(0));
    let max_extra_freq = postings
        .iter()
        .map(|p| p.term_frequency.saturating_sub(1))
        .max()
        .unwrap_or(0);
    let freq_width = if max_extra_freq == 0 {
        0
    } else {
        byte_width(max_extra_freq)
    };

    out.push(postings.len() as u8);
    out.push(doc_width as u8);
    out.push(freq_width as u8);
    for &delta in &deltas {
        write_packed(delta, doc_width, out);
    }
    if freq_width > 0 {
        for posting in postings {
            write_packed(posting.term_frequency.saturating_sub(1), freq_width, out);
        }
    }
    prev
}

/// Writer for posting lists
pub struct PostingsWriter {
    /// Encoded lists, back to back
    data: Vec<u8>,
    /// Postings of the list being built
    pending: Vec<Posting>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Start writing a new posting list
    pub fn start_posting_list(&mut self) {
        self.pending.clear();
    }

    /// Add a posting to the current list; documents must arrive in
    /// increasing id order
    pub fn add_posting(&mut self, posting: Posting) {
        debug_assert!(
            self.pending.last().map_or(true, |p| p.doc < posting.doc),
            "postings must arrive in increasing document order"
        );
        self.pending.push(posting);
    }

    /// Finish the current posting list and return its metadata
    pub fn finish_posting_list(&mut self, docs_count: u32, total_term_frequency: u64) -> TermInfo {
        let offset = self.data.len() as u64;

        let mut directory: Vec<(u32, u32)> = Vec::new();
        let mut prev_doc = 0u32;
        for block in self.pending.chunks(BLOCK_CAPACITY) {
            let block_offset = (self.data.len() as u64 - offset) as u32;
            prev_doc = encode_block(prev_doc, block, &mut self.data);
            directory.push((prev_doc, block_offset));
        }

        for &(last_doc, block_offset) in &directory {
            self.data.extend_from_slice(&last_doc.to_le_bytes());
            self.data.extend_from_slice(&block_offset.to_le_bytes());
        }
        self.data
            .extend_from_slice(&(directory.len() as u32).to_le_bytes());

        self.pending.clear();
        TermInfo {
            offset,
            length: self.data.len() as u64 - offset,
            docs_count,
            total_term_frequency,
        }
    }

    /// Take the data (consuming the writer)
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl Default for PostingsWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader over a field's postings region
pub struct PostingsReader {
    data: Vec<u8>,
}

impl PostingsReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Iterator over the posting list described by `info`
    pub fn postings(&self, info: &TermInfo) -> io::Result<PostingIterator<'_>> {
        let start = info.offset as usize;
        let end = (info.offset + info.length) as usize;

        if end > self.data.len() || start > end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Posting list extends beyond data",
            ));
        }

        PostingIterator::new(&self.data[start..end], info.docs_count as u64)
    }
}

/// Doc iterator over one encoded posting list
pub struct PostingIterator<'a> {
    data: &'a [u8],
    /// Where the directory begins; blocks live in `data[..directory_start]`
    directory_start: usize,
    block_count: usize,
    /// Index of the block to decode next
    next_block: usize,
    /// Decoded postings of the current block
    current: Vec<(DocId, u32)>,
    /// Next entry of `current` to emit
    cursor: usize,
    doc: DocId,
    freq: u32,
    cost: u64,
}

impl<'a> PostingIterator<'a> {
    fn new(data: &'a [u8], cost: u64) -> io::Result<Self> {
        if data.len() < TRAILER_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Posting list shorter than its trailer",
            ));
        }
        let trailer = data.len() - TRAILER_BYTES;
        let block_count =
            u32::from_le_bytes(data[trailer..].try_into().expect("trailer word")) as usize;

        let directory_len = block_count * DIRECTORY_ENTRY_BYTES;
        if directory_len > trailer {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Posting list directory extends beyond data",
            ));
        }

        Ok(Self {
            data,
            directory_start: trailer - directory_len,
            block_count,
            next_block: 0,
            current: Vec::new(),
            cursor: 0,
            doc: DocId::INVALID,
            freq: 0,
            cost,
        })
    }

    fn directory_entry(&self, block: usize) -> (u32, u32) {
        let at = self.directory_start + block * DIRECTORY_ENTRY_BYTES;
        let last_doc = u32::from_le_bytes(self.data[at..at + 4].try_into().expect("entry"));
        let offset = u32::from_le_bytes(self.data[at + 4..at + 8].try_into().expect("entry"));
        (last_doc, offset)
    }

    /// Decode `block` into `current` and aim the cursor at its first entry
    fn decode_block(&mut self, block: usize) -> io::Result<()> {
        let (_, offset) = self.directory_entry(block);
        let mut prev = if block == 0 {
            0
        } else {
            self.directory_entry(block - 1).0
        };

        let blocks = &self.data[..self.directory_start];
        let header = offset as usize;
        if header + 3 > blocks.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Truncated block header",
            ));
        }
        let count = blocks[header] as usize;
        let doc_width = blocks[header + 1] as usize;
        let freq_width = blocks[header + 2] as usize;
        if count == 0 || count > BLOCK_CAPACITY || !(1..=4).contains(&doc_width) || freq_width > 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Malformed block header",
            ));
        }

        let docs_at = header + 3;
        let freqs_at = docs_at + count * doc_width;
        let block_end = freqs_at + count * freq_width;
        if block_end > blocks.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Truncated block payload",
            ));
        }

        self.current.clear();
        for i in 0..count {
            prev += read_packed(&blocks[docs_at + i * doc_width..], doc_width);
            let freq = if freq_width == 0 {
                1
            } else {
                read_packed(&blocks[freqs_at + i * freq_width..], freq_width) + 1
            };
            self.current.push((DocId(prev), freq));
        }

        self.cursor = 0;
        self.next_block = block + 1;
        Ok(())
    }

    fn exhaust(&mut self) -> DocId {
        self.doc = DocId::EOF;
        self.freq = 0;
        self.doc
    }
}

impl DocIterator for PostingIterator<'_> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> bool {
        if self.doc == DocId::EOF {
            return false;
        }
        if self.cursor >= self.current.len() {
            let block = self.next_block;
            // a decode failure drops the rest of the list, not the query
            if block >= self.block_count || self.decode_block(block).is_err() {
                self.exhaust();
                return false;
            }
        }
        let (doc, freq) = self.current[self.cursor];
        self.cursor += 1;
        self.doc = doc;
        self.freq = freq;
        true
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target == DocId::INVALID {
            return self.doc;
        }
        if target == DocId::EOF {
            return self.exhaust();
        }
        if self.doc != DocId::INVALID && self.doc >= target {
            return self.doc;
        }

        // scan the decoded block while it can still contain the target
        if self.cursor < self.current.len()
            && self.current[self.current.len() - 1].0 >= target
        {
            while self.next() {
                if self.doc >= target {
                    return self.doc;
                }
            }
            return self.doc;
        }

        // binary-search the directory for the first block whose last
        // document reaches the target
        let mut lo = self.next_block;
        let mut hi = self.block_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.directory_entry(mid).0 < target.as_u32() {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo >= self.block_count || self.decode_block(lo).is_err() {
            return self.exhaust();
        }

        while self.next() {
            if self.doc >= target {
                return self.doc;
            }
        }
        self.doc
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn freq(&self) -> u32 {
        self.freq
    }
}

/// Iterator over no documents at all
#[derive(Default)]
pub struct EmptyDocIterator {
    exhausted: bool,
}

impl DocIterator for EmptyDocIterator {
    fn doc(&self) -> DocId {
        if self.exhausted {
            DocId::EOF
        } else {
            DocId::INVALID
        }
    }

    fn next(&mut self) -> bool {
        self.exhausted = true;
        false
    }

    fn seek(&mut self, _target: DocId) -> DocId {
        self.exhausted = true;
        DocId::EOF
    }

    fn cost(&self) -> u64 {
        0
    }
}
