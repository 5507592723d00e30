//! Wildcard filter
//!
//! Patterns use `%` for any run of bytes, `_` for exactly one byte and `\`
//! to escape. Preparation classifies the pattern first: a pattern without
//! wildcards decays to the exact-term query, `%` alone matches every term,
//! a trailing-`%` pattern runs as a prefix, and everything else goes
//! through the compiled acceptor.

use serde::{Deserialize, Serialize};

use super::filter::{Filter, PrepareContext, PreparedQuery};
use super::multiterm::prepare_automaton_filter;
use super::term_query::prepare_term;
use crate::automaton::{wildcard, Acceptor};

fn default_boost() -> f32 {
    1.0
}

fn default_scored_terms_limit() -> Option<usize> {
    Some(1024)
}

/// Filter matching terms against a wildcard pattern
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WildcardFilter {
    /// Field to search in
    pub field: String,
    /// Search pattern
    pub term: String,
    /// Maximum number of most frequent terms to score; `None` scores all
    #[serde(default = "default_scored_terms_limit")]
    pub scored_terms_limit: Option<usize>,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f32,
}

impl WildcardFilter {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            scored_terms_limit: default_scored_terms_limit(),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_scored_terms_limit(mut self, limit: Option<usize>) -> Self {
        self.scored_terms_limit = limit;
        self
    }
}

impl Filter for WildcardFilter {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Box<dyn PreparedQuery> {
        let pattern = self.term.as_bytes();
        let boost = ctx.boost * self.boost;
        let ctx = PrepareContext {
            index: ctx.index,
            order: ctx.order.clone(),
            boost,
            cancel: ctx.cancel.clone(),
        };

        let acceptor = match wildcard::wildcard_kind(pattern) {
            wildcard::WildcardKind::Term => {
                return prepare_term(&ctx, &self.field, &wildcard::unescape(pattern), 1.0);
            }
            wildcard::WildcardKind::MatchAll => Acceptor::prefix(b""),
            wildcard::WildcardKind::Prefix => {
                Acceptor::prefix(&wildcard::prefix_bytes(pattern))
            }
            wildcard::WildcardKind::Wildcard => wildcard::wildcard_acceptor(pattern),
        };

        prepare_automaton_filter(
            &ctx,
            &self.field,
            &acceptor,
            self.scored_terms_limit,
            |it| (Some(it.docs_count() as f32), 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{DocIterator, Index, SegmentId, SegmentWriter};

    fn index(terms: &[&str]) -> Index {
        let mut writer = SegmentWriter::new(SegmentId::new(0));
        for term in terms {
            writer.begin_document();
            writer.index_term("f", term.as_bytes());
        }
        Index::new(vec![writer.build().unwrap()])
    }

    fn matched(index: &Index, pattern: &str) -> Vec<u32> {
        let ctx = PrepareContext::unordered(index);
        let query = WildcardFilter::new("f", pattern).prepare(&ctx);
        let mut docs = Vec::new();
        for (ord, segment) in index.segments().iter().enumerate() {
            let mut iter = query.execute(segment, ord);
            while iter.next() {
                docs.push(iter.doc().as_u32());
            }
        }
        docs
    }

    #[test]
    fn test_trailing_run() {
        let index = index(&["foo", "foobar", "foa", "foabar"]);
        assert_eq!(matched(&index, "foo%"), vec![0, 1]);
    }

    #[test]
    fn test_leading_run() {
        let index = index(&["foo", "bfoo", "foobar"]);
        assert_eq!(matched(&index, "%foo"), vec![0, 1]);
    }

    #[test]
    fn test_single_byte_wildcard() {
        let index = index(&["azbce1d", "azbce1d1", "azbce11d"]);
        assert_eq!(matched(&index, "a%bce_d"), vec![0]);
    }

    #[test]
    fn test_no_wildcards_decays_to_term() {
        let index = index(&["exact", "exacter"]);
        assert_eq!(matched(&index, "exact"), vec![0]);
    }

    #[test]
    fn test_match_all() {
        let index = index(&["a", "b"]);
        assert_eq!(matched(&index, "%"), vec![0, 1]);
    }
}
