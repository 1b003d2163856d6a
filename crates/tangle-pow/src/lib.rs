//! # Tangle PoW
//!
//! Proof-of-work search over transaction payloads.
//!
//! A payload's weight magnitude is the number of trailing zero trits of its
//! hash. Searching rewrites the 27-tryte nonce field until the weight reaches
//! the requested minimum, or until the search is cancelled.
//!
//! ```rust,ignore
//! use tangle_pow::{CpuPowEngine, PowEngine};
//!
//! let engine = CpuPowEngine::new(4, 10_000)?;
//! if let Some(trytes) = engine.search(&payload, 9)? {
//!     // trytes now carries a nonce satisfying weight 9
//! }
//! ```

pub mod backends;

#[cfg(feature = "test-utils")]
pub mod test_utils;

#[cfg(feature = "cpu")]
pub use backends::cpu::CpuPowEngine;

use std::sync::atomic::{AtomicBool, Ordering};
use tangle_types::CodecError;
use thiserror::Error;

/// Highest reachable weight magnitude: every trit of an 81-tryte hash.
pub const MAX_WEIGHT_MAGNITUDE: u8 = 243;

/// PoW engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PowError {
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] CodecError),

    #[error("weight magnitude {requested} exceeds maximum {max}")]
    InvalidDifficulty { requested: u8, max: u8 },

    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),
}

/// Description of an engine, reported through node info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub name: String,
    pub threads: usize,
}

/// Nonce search primitive.
///
/// `search` blocks the calling thread. `cancel` may be called from any other
/// thread and makes an in-flight search return `Ok(None)` at its next check.
/// Cancellation sticks until `reset`, so a caller running several searches
/// in a row sees an interrupt that lands between two of them.
pub trait PowEngine: Send + Sync {
    fn info(&self) -> &EngineInfo;

    /// Find a nonce giving `trytes` at least `min_weight_magnitude`.
    ///
    /// Returns the payload with its nonce field rewritten, or `None` when the
    /// search was cancelled.
    fn search(&self, trytes: &str, min_weight_magnitude: u8)
        -> Result<Option<String>, PowError>;

    /// Abort the in-flight search, if any, and every later one until `reset`.
    fn cancel(&self);

    /// Clear a previous cancellation.
    fn reset(&self);

    /// Whether `cancel` was called since the last `reset`.
    fn is_cancelled(&self) -> bool;
}

/// Cancellation flag shared by the engines.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reject difficulties no hash can reach.
pub fn check_difficulty(min_weight_magnitude: u8) -> Result<(), PowError> {
    if min_weight_magnitude > MAX_WEIGHT_MAGNITUDE {
        return Err(PowError::InvalidDifficulty {
            requested: min_weight_magnitude,
            max: MAX_WEIGHT_MAGNITUDE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_difficulty() {
        assert!(check_difficulty(0).is_ok());
        assert!(check_difficulty(MAX_WEIGHT_MAGNITUDE).is_ok());
        assert_eq!(
            check_difficulty(244),
            Err(PowError::InvalidDifficulty {
                requested: 244,
                max: MAX_WEIGHT_MAGNITUDE
            })
        );
    }

    #[test]
    fn test_cancel_flag_sticks_until_reset() {
        let flag = CancelFlag::default();
        assert!(!flag.is_set());
        flag.cancel();
        flag.cancel();
        assert!(flag.is_set());
        flag.reset();
        assert!(!flag.is_set());
    }
}
