//! Text analyzer with stemming and stopword removal

use std::collections::HashSet;

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use super::analyzer::Analyzer;
use super::token::TokenAttributes;

/// Options for [`TextAnalyzer`]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub language: String,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 2,
            max_token_length: 50,
            language: "english".to_string(),
        }
    }
}

/// Unicode-word tokenizer with optional lowercasing, stop-word removal and
/// Snowball stemming.
///
/// Filtered-out words (stop words, words outside the length bounds) leave a
/// position gap: the next emitted token carries the accumulated increment.
pub struct TextAnalyzer {
    options: TextOptions,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
    tokens: Vec<TokenAttributes>,
    cursor: usize,
}

impl TextAnalyzer {
    /// Create a new text analyzer from options
    pub fn new(options: TextOptions) -> Self {
        let stemmer = if options.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if options.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            options,
            stemmer,
            stopwords,
            tokens: Vec::new(),
            cursor: 0,
        }
    }
}

impl Analyzer for TextAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        self.tokens.clear();
        self.cursor = 0;

        let mut pending_inc = 1u32;
        for (offset, word) in input.unicode_word_indices() {
            let mut token = word.to_string();
            if self.options.lowercase {
                token = token.to_lowercase();
            }

            let keep = token.len() >= self.options.min_token_length
                && token.len() <= self.options.max_token_length
                && !self.stopwords.contains(&token);
            if !keep {
                pending_inc += 1;
                continue;
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token).to_string();
            }

            self.tokens.push(TokenAttributes {
                term: token.into_bytes(),
                pos_inc: pending_inc,
                start: offset as u32,
                end: (offset + word.len()) as u32,
                payload: None,
            });
            pending_inc = 1;
        }
        true
    }

    fn next(&mut self) -> bool {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn attributes(&self) -> &TokenAttributes {
        debug_assert!(self.cursor > 0 && self.cursor <= self.tokens.len());
        &self.tokens[self.cursor - 1]
    }
}
