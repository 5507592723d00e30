//! # grist
//!
//! An inverted-index search core built around automaton-driven term
//! matching:
//!
//! - a composable **analysis pipeline** where each analyzer re-tokenizes
//!   the terms of the previous one while positions and offsets stay
//!   relative to the original input;
//! - **multi-term filters** (prefix, wildcard, Levenshtein) whose
//!   deterministic byte acceptors drive per-segment FST term dictionaries,
//!   skipping dictionary subtrees that cannot match;
//! - a **bounded term-statistics collector** that scores only the top-K
//!   most informative matched terms while keeping every match in the
//!   result;
//! - **two-phase scoring**: field- and term-level collectors fill opaque
//!   per-bucket statistics buffers that feed per-document scorers at
//!   execution time.

pub mod analysis;
pub mod automaton;
pub mod error;
pub mod search;
pub mod segment;

// Re-exports for the public API
pub use analysis::{Analyzer, PipelineTokenStream, TokenAttributes};
pub use error::{GristError, Result};
pub use search::{
    BoostSort, Cancellation, Filter, LevenshteinFilter, MergeType, Order, PrefixFilter,
    PrepareContext, PreparedQuery, TermFilter, TfIdfSort, WildcardFilter,
};
pub use segment::{DocId, DocIterator, Index, SegmentId, SegmentReader, SegmentWriter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
