//! The analyzer capability shared by all token producers

use super::token::TokenAttributes;

/// A lazy token producer.
///
/// Usage protocol: `reset(input)` prepares the analyzer for a new input and
/// returns `false` if the input cannot be handled; each successful `next()`
/// positions the analyzer on the next token, whose attributes are readable
/// through [`Analyzer::attributes`]. Attribute values are undefined before
/// the first `next()` after a reset and after `next()` has returned `false`.
pub trait Analyzer: Send {
    /// Prepare the analyzer to tokenize `input`.
    fn reset(&mut self, input: &str) -> bool;

    /// Advance to the next token.
    fn next(&mut self) -> bool;

    /// Attributes of the current token.
    fn attributes(&self) -> &TokenAttributes;
}
