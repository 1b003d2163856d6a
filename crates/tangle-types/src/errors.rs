//! # Error Types
//!
//! Errors raised while decoding tryte strings into typed values.

use thiserror::Error;

/// Errors that can occur while decoding trytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A character outside `9A-Z` was found.
    #[error("invalid tryte '{found}' at position {position}")]
    InvalidTryte { found: char, position: usize },

    /// The input does not have the exact width of the target field.
    #[error("invalid length: expected {expected} trytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A tag longer than the tag field.
    #[error("tag too long: {actual} trytes (max {max})")]
    TagTooLong { actual: usize, max: usize },

    /// An encoded integer does not fit into the target type.
    #[error("value out of range for field '{field}'")]
    ValueOutOfRange { field: &'static str },
}
