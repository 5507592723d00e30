//! Delimiter analyzer: splits input on a literal delimiter string

use serde::{Deserialize, Serialize};

use super::analyzer::Analyzer;
use super::token::TokenAttributes;

/// Options for [`DelimiterAnalyzer`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelimiterOptions {
    /// Literal delimiter the input is split on
    pub delimiter: String,
}

/// Splits its input on a literal delimiter, emitting one token per piece.
///
/// Every token advances the position by one; offsets are exact byte ranges
/// of the piece within the input. Consecutive delimiters yield empty terms.
pub struct DelimiterAnalyzer {
    delimiter: String,
    input: String,
    cursor: usize,
    done: bool,
    attrs: TokenAttributes,
}

impl DelimiterAnalyzer {
    pub fn new(options: DelimiterOptions) -> Self {
        Self {
            delimiter: options.delimiter,
            input: String::new(),
            cursor: 0,
            done: true,
            attrs: TokenAttributes::default(),
        }
    }
}

impl Analyzer for DelimiterAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        if self.delimiter.is_empty() {
            return false;
        }
        self.input.clear();
        self.input.push_str(input);
        self.cursor = 0;
        self.done = false;
        self.attrs.clear();
        true
    }

    fn next(&mut self) -> bool {
        if self.done {
            return false;
        }

        let rest = &self.input[self.cursor..];
        let (piece_len, step) = match rest.find(&self.delimiter) {
            Some(idx) => (idx, idx + self.delimiter.len()),
            None => {
                self.done = true;
                (rest.len(), rest.len())
            }
        };

        let start = self.cursor;
        let end = start + piece_len;
        self.attrs.term.clear();
        self.attrs.term.extend_from_slice(self.input[start..end].as_bytes());
        self.attrs.pos_inc = 1;
        self.attrs.start = start as u32;
        self.attrs.end = end as u32;
        self.cursor += step;
        true
    }

    fn attributes(&self) -> &TokenAttributes {
        &self.attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(analyzer: &mut DelimiterAnalyzer, input: &str) -> Vec<(String, u32, u32, u32)> {
        assert!(analyzer.reset(input));
        let mut out = Vec::new();
        while analyzer.next() {
            let attrs = analyzer.attributes();
            out.push((
                String::from_utf8(attrs.term.clone()).unwrap(),
                attrs.pos_inc,
                attrs.start,
                attrs.end,
            ));
        }
        out
    }

    #[test]
    fn test_basic_split() {
        let mut analyzer = DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: "-".to_string(),
        });
        let tokens = drain(&mut analyzer, "Aa-Bb");
        assert_eq!(
            tokens,
            vec![
                ("Aa".to_string(), 1, 0, 2),
                ("Bb".to_string(), 1, 3, 5),
            ]
        );
    }

    #[test]
    fn test_consecutive_delimiters_yield_empty_terms() {
        let mut analyzer = DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: ",".to_string(),
        });
        let tokens = drain(&mut analyzer, "a,,b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].0, "");
    }

    #[test]
    fn test_no_delimiter_single_token() {
        let mut analyzer = DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: "-".to_string(),
        });
        let tokens = drain(&mut analyzer, "plain");
        assert_eq!(tokens, vec![("plain".to_string(), 1, 0, 5)]);
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let mut analyzer = DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: String::new(),
        });
        assert!(!analyzer.reset("anything"));
    }

    #[test]
    fn test_reset_reuses_analyzer() {
        let mut analyzer = DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: "-".to_string(),
        });
        assert_eq!(drain(&mut analyzer, "a-b").len(), 2);
        assert_eq!(drain(&mut analyzer, "c").len(), 1);
    }
}
