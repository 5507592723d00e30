//! Text analysis: token attributes, analyzers and the pipeline token stream
//!
//! An [`Analyzer`] is a lazy token producer: `reset(input)` prepares it for a
//! new input, repeated `next()` calls drain tokens, and [`TokenAttributes`]
//! exposes the current token. [`PipelineTokenStream`] composes a sequence of
//! analyzers so that each term emitted by stage *i* becomes the input text of
//! stage *i + 1*, while positions and offsets are aggregated to stay relative
//! to the top-level input.

mod analyzer;
mod delimiter;
mod lowercase;
mod pipeline;
pub mod registry;
mod text;
mod token;

pub use analyzer::Analyzer;
pub use delimiter::{DelimiterAnalyzer, DelimiterOptions};
pub use lowercase::LowercaseAnalyzer;
pub use pipeline::PipelineTokenStream;
pub use registry::ConfigFormat;
pub use text::{TextAnalyzer, TextOptions};
pub use token::TokenAttributes;
