//! # Domain Errors
//!
//! Failures surfaced by [`crate::GraphStore`] implementations.

use crate::domain::entities::Pointer;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The null pointer was dereferenced.
    #[error("null pointer dereferenced")]
    NullPointer,

    /// A pointer beyond the allocated range.
    #[error("pointer {pointer} out of range (allocated: {allocated})")]
    OutOfRange { pointer: Pointer, allocated: u64 },

    /// The arena cannot grow further.
    #[error("store capacity of {capacity} records exhausted")]
    CapacityExhausted { capacity: usize },
}
