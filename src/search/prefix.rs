//! Prefix filter

use serde::{Deserialize, Serialize};

use super::filter::{Filter, PrepareContext, PreparedQuery};
use super::multiterm::prepare_automaton_filter;
use crate::automaton::Acceptor;

fn default_boost() -> f32 {
    1.0
}

fn default_scored_terms_limit() -> Option<usize> {
    Some(1024)
}

/// Filter matching every term with a common prefix.
///
/// Terms with longer posting lists are more important for the scored-terms
/// cut.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrefixFilter {
    /// Field to search in
    pub field: String,
    /// Term prefix
    pub term: String,
    /// Maximum number of most frequent terms to score; `None` scores all
    #[serde(default = "default_scored_terms_limit")]
    pub scored_terms_limit: Option<usize>,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f32,
}

impl PrefixFilter {
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

impl Filter for PrefixFilter {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Box<dyn PreparedQuery> {
        let boost = ctx.boost * self.boost;
        let ctx = PrepareContext {
            index: ctx.index,
            order: ctx.order.clone(),
            boost,
            cancel: ctx.cancel.clone(),
        };
        let acceptor = Acceptor::prefix(self.term.as_bytes());
        prepare_automaton_filter(
            &ctx,
            &self.field,
            &acceptor,
            self.scored_terms_limit,
            |it| (Some(it.docs_count() as f32), 1.0),
        )
    }
}
