//! Edit-distance (Levenshtein) filter

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::filter::{empty_query, Filter, PrepareContext, PreparedQuery};
use super::multiterm::prepare_automaton_filter;
use super::term_query::prepare_term;
use crate::automaton::levenshtein::{self, ParametricDescription};

fn default_boost() -> f32 {
    1.0
}

fn default_scored_terms_limit() -> Option<usize> {
    Some(1024)
}

/// Source of parametric descriptions; the default computes and caches them
/// process-wide
pub type DescriptionProvider = fn(u8, bool) -> Option<Arc<ParametricDescription>>;

fn default_provider() -> DescriptionProvider {
    levenshtein::description
}

/// Similarity key of a matched term:
/// `1 − distance / max(1, min(|candidate|, |query|))` over code points.
fn similarity(distance: u32, size: u32) -> f32 {
    1.0 - distance as f32 / size.max(1) as f32
}

fn utf8_length(bytes: &[u8]) -> u32 {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.chars().count() as u32,
        Err(_) => bytes.len() as u32,
    }
}

/// Filter matching terms within an edit distance of a query term.
///
/// A `max_distance` of zero decays to the exact-term filter; distances with
/// no parametric description prepare to the empty query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevenshteinFilter {
    /// Field to search in
    pub field: String,
    /// Term to match approximately
    pub term: String,
    /// Maximum edit distance
    #[serde(default)]
    pub max_distance: u8,
    /// Whether a transposition counts as a single edit
    #[serde(default)]
    pub with_transpositions: bool,
    /// Maximum number of highest-similarity terms to score; `None` scores
    /// all
    #[serde(default = "default_scored_terms_limit")]
    pub scored_terms_limit: Option<usize>,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f32,
    /// Parametric description source
    #[serde(skip, default = "default_provider")]
    pub provider: DescriptionProvider,
}

impl LevenshteinFilter {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            max_distance: 0,
            with_transpositions: false,
            scored_terms_limit: default_scored_terms_limit(),
            boost: 1.0,
            provider: default_provider(),
        }
    }

    pub fn with_max_distance(mut self, max_distance: u8) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_transpositions(mut self, with_transpositions: bool) -> Self {
        self.with_transpositions = with_transpositions;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_scored_terms_limit(mut self, limit: Option<usize>) -> Self {
        self.scored_terms_limit = limit;
        self
    }

    pub fn with_provider(mut self, provider: DescriptionProvider) -> Self {
        self.provider = provider;
        self
    }
}

impl Filter for LevenshteinFilter {
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Box<dyn PreparedQuery> {
        let boost = ctx.boost * self.boost;
        let ctx = PrepareContext {
            index: ctx.index,
            order: ctx.order.clone(),
            boost,
            cancel: ctx.cancel.clone(),
        };

        if self.max_distance == 0 {
            return prepare_term(&ctx, &self.field, self.term.as_bytes(), 1.0);
        }

        let Some(description) = (self.provider)(self.max_distance, self.with_transpositions)
        else {
            warn!(
                max_distance = self.max_distance,
                with_transpositions = self.with_transpositions,
                "no parametric description available; yielding no documents"
            );
            return empty_query();
        };

        let acceptor = description.build_acceptor(self.term.as_bytes());
        let query_len = utf8_length(self.term.as_bytes());

        prepare_automaton_filter(
            &ctx,
            &self.field,
            &acceptor,
            self.scored_terms_limit,
            move |it| match it.payload() {
                Some(distance) => {
                    let size = utf8_length(it.value()).min(query_len);
                    let key = similarity(distance as u32, size);
                    (Some(key), key)
                }
                // no distance reported: matches, but is never scored
                None => (None, 1.0),
            },
        )
    }
}
