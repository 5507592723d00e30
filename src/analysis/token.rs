//! Per-token attributes published by analyzers

/// Attributes of an analyzer's current token.
///
/// A position increment of `0` keeps the token at the same logical position
/// as the previous one; `1` or more advances it by that many steps (gaps are
/// allowed, e.g. after stop-word removal). `start` and `end` are byte offsets
/// into the input the analyzer was last reset with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenAttributes {
    /// Term bytes
    pub term: Vec<u8>,
    /// Position increment relative to the previous token
    pub pos_inc: u32,
    /// Byte offset of the first byte of the token
    pub start: u32,
    /// Byte offset one past the last byte of the token
    pub end: u32,
    /// Optional per-token payload
    pub payload: Option<Vec<u8>>,
}

impl TokenAttributes {
    /// Reset to the state expected right after an analyzer `reset`.
    pub fn clear(&mut self) {
        self.term.clear();
        self.pos_inc = 0;
        self.start = 0;
        self.end = 0;
        self.payload = None;
    }

    /// Term bytes interpreted as UTF-8, if valid.
    pub fn term_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.term).ok()
    }
}
