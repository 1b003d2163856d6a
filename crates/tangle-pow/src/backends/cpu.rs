//! CPU PoW backend using Rayon
//!
//! Each worker owns a disjoint nonce range and a private copy of the payload.
//! Workers stop on the first hit from any of them, or when the engine is
//! cancelled. A cancelled engine returns no result until it is reset.

use crate::{check_difficulty, CancelFlag, EngineInfo, PowEngine, PowError};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tangle_types::{layout, trytes, Hash, Transaction};
use tracing::debug;

/// Nonces checked between two reads of the cancellation flag.
pub const DEFAULT_CHECK_INTERVAL: u64 = 10_000;

/// Worker `i` starts its counter at `i << NONCE_SPAN_BITS`.
const NONCE_SPAN_BITS: u32 = 40;

/// CPU-based PoW engine using a dedicated Rayon pool
pub struct CpuPowEngine {
    info: EngineInfo,
    pool: rayon::ThreadPool,
    check_interval: u64,
    cancelled: CancelFlag,
}

impl CpuPowEngine {
    pub fn new(threads: usize, check_interval: u64) -> Result<Self, PowError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pow-worker-{i}"))
            .build()
            .map_err(|e| PowError::WorkerPool(e.to_string()))?;

        Ok(Self {
            info: EngineInfo {
                name: format!("CPU ({} threads)", threads),
                threads,
            },
            pool,
            check_interval: check_interval.max(1),
            cancelled: CancelFlag::default(),
        })
    }

    /// One worker per logical core.
    pub fn with_available_cores() -> Result<Self, PowError> {
        Self::new(num_cpus::get(), DEFAULT_CHECK_INTERVAL)
    }
}

impl std::fmt::Debug for CpuPowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPowEngine")
            .field("info", &self.info)
            .field("check_interval", &self.check_interval)
            .finish()
    }
}

impl PowEngine for CpuPowEngine {
    fn info(&self) -> &EngineInfo {
        &self.info
    }

    fn search(
        &self,
        candidate: &str,
        min_weight_magnitude: u8,
    ) -> Result<Option<String>, PowError> {
        check_difficulty(min_weight_magnitude)?;
        Transaction::from_trytes(candidate)?;

        if self.cancelled.is_set() {
            debug!("search skipped, engine is cancelled");
            return Ok(None);
        }
        let template = candidate.as_bytes();
        let found = AtomicBool::new(false);
        let result: Mutex<Option<String>> = Mutex::new(None);
        let workers = self.info.threads as u64;

        debug!(
            min_weight_magnitude,
            workers, "starting nonce search"
        );

        self.pool.install(|| {
            (0..workers).into_par_iter().for_each(|worker| {
                let mut buffer = template.to_vec();
                let mut counter = worker << NONCE_SPAN_BITS;

                loop {
                    // Early exit if another worker found it
                    if found.load(Ordering::Relaxed) {
                        break;
                    }
                    if counter % self.check_interval == 0 && self.cancelled.is_set() {
                        break;
                    }

                    let nonce = trytes::encode_i64(counter as i64, layout::NONCE.len());
                    buffer[layout::NONCE].copy_from_slice(&nonce);

                    if Hash::digest(&buffer).weight_magnitude() >= min_weight_magnitude {
                        if !found.swap(true, Ordering::SeqCst) {
                            *result.lock() = Some(buffer.iter().map(|b| char::from(*b)).collect());
                        }
                        break;
                    }
                    counter += 1;
                }
            });
        });

        let outcome = result.into_inner();
        debug!(found = outcome.is_some(), "nonce search finished");
        Ok(outcome)
    }

    fn cancel(&self) {
        self.cancelled.cancel();
    }

    fn reset(&self) {
        self.cancelled.reset();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tangle_types::TransactionBuilder;

    fn payload() -> String {
        TransactionBuilder::new().value(11).to_trytes()
    }

    #[test]
    fn test_search_reaches_weight() {
        let engine = CpuPowEngine::new(2, 100).unwrap();
        let original = payload();
        let found = engine.search(&original, 4).unwrap().unwrap();

        let tx = Transaction::from_trytes(&found).unwrap();
        assert!(tx.weight_magnitude() >= 4);
        // Only the nonce field changes.
        assert_eq!(&found[..layout::NONCE.start], &original[..layout::NONCE.start]);
    }

    #[test]
    fn test_search_rejects_bad_input() {
        let engine = CpuPowEngine::new(1, 100).unwrap();
        assert!(matches!(
            engine.search("ABC", 1),
            Err(PowError::InvalidPayload(_))
        ));
        assert!(matches!(
            engine.search(&payload(), 250),
            Err(PowError::InvalidDifficulty { requested: 250, .. })
        ));
    }

    #[test]
    fn test_cancel_aborts_search() {
        let engine = Arc::new(CpuPowEngine::new(2, 16).unwrap());
        let worker = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.search(&payload(), 243))
        };
        std::thread::sleep(Duration::from_millis(50));
        engine.cancel();
        assert_eq!(worker.join().unwrap().unwrap(), None);

        // Cancellation holds until reset.
        assert!(engine.is_cancelled());
        assert_eq!(engine.search(&payload(), 0).unwrap(), None);
        engine.reset();
        assert!(engine.search(&payload(), 1).unwrap().is_some());
    }

    #[test]
    fn test_zero_threads_is_clamped() {
        let engine = CpuPowEngine::new(0, 0).unwrap();
        assert_eq!(engine.info().threads, 1);
        assert!(engine.search(&payload(), 0).unwrap().is_some());
    }
}
