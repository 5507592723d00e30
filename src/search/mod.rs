//! Query preparation and execution
//!
//! A [`Filter`] is prepared against an [`Index`](crate::segment::Index) and
//! a sort [`Order`] into an immutable [`PreparedQuery`]; preparation is
//! total and degrades to an empty query instead of failing. Execution turns
//! a prepared query into per-segment doc iterators whose scores are merged
//! bucket-wise under the query's merge policy.

mod boost;
mod collectors;
mod doc_iterator;
mod filter;
mod levenshtein;
mod multiterm;
mod prefix;
mod sample;
mod sort;
mod term_query;
mod tfidf;
mod wildcard;

pub use boost::BoostSort;
pub use collectors::{FieldCollectors, TermCollectors};
pub use doc_iterator::{BitsetDocIterator, Disjunction, ScoredDocIterator};
pub use filter::{empty_query, Cancellation, EmptyQuery, Filter, PrepareContext, PreparedQuery};
pub use levenshtein::{DescriptionProvider, LevenshteinFilter};
pub use multiterm::{MultiTermQuery, SegmentState};
pub use prefix::PrefixFilter;
pub use sample::{AllTermsCollector, LimitedSampleCollector, TermCandidate};
pub use sort::{
    Bucket, FieldCollector, MergeType, Order, Scorer, Scorers, Sort, TermCollector, TermStats,
};
pub use term_query::{TermFilter, TermQuery};
pub use tfidf::TfIdfSort;
pub use wildcard::WildcardFilter;
