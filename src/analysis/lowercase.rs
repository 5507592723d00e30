//! Lowercase analyzer: a one-token normalizer

use super::analyzer::Analyzer;
use super::token::TokenAttributes;

/// Emits its whole input as a single lowercased token.
///
/// Offsets always span the full input; the term may differ in byte length
/// from the input for non-ASCII text.
#[derive(Default)]
pub struct LowercaseAnalyzer {
    input_len: u32,
    pending: Option<String>,
    attrs: TokenAttributes,
}

impl LowercaseAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Analyzer for LowercaseAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        self.input_len = input.len() as u32;
        self.pending = Some(input.to_lowercase());
        self.attrs.clear();
        true
    }

    fn next(&mut self) -> bool {
        match self.pending.take() {
            Some(lowered) => {
                self.attrs.term.clear();
                self.attrs.term.extend_from_slice(lowered.as_bytes());
                self.attrs.pos_inc = 1;
                self.attrs.start = 0;
                self.attrs.end = self.input_len;
                true
            }
            None => false,
        }
    }

    fn attributes(&self) -> &TokenAttributes {
        &self.attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token() {
        let mut analyzer = LowercaseAnalyzer::new();
        assert!(analyzer.reset("HeLLo"));
        assert!(analyzer.next());
        let attrs = analyzer.attributes();
        assert_eq!(attrs.term, b"hello");
        assert_eq!(attrs.pos_inc, 1);
        assert_eq!((attrs.start, attrs.end), (0, 5));
        assert!(!analyzer.next());
    }

    #[test]
    fn test_empty_input() {
        let mut analyzer = LowercaseAnalyzer::new();
        assert!(analyzer.reset(""));
        assert!(analyzer.next());
        assert_eq!(analyzer.attributes().term, b"");
        assert!(!analyzer.next());
    }
}
