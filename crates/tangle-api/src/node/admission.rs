//! Attach-to-graph pipeline.
//!
//! Chains a batch of payloads onto a trunk/branch pair and runs
//! proof-of-work over each one in turn. Only one attach runs at a time.

use crate::domain::error::{ApiError, ApiResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tangle_pow::{check_difficulty, PowEngine, PowError};
use tangle_types::{Hash, Transaction};
use tracing::{debug, info};

pub struct AdmissionPipeline {
    pow: Arc<dyn PowEngine>,
    attach_lock: Mutex<()>,
}

impl AdmissionPipeline {
    pub fn new(pow: Arc<dyn PowEngine>) -> Self {
        Self {
            pow,
            attach_lock: Mutex::new(()),
        }
    }

    /// Name of the proof-of-work engine behind this pipeline.
    pub fn engine_name(&self) -> &str {
        &self.pow.info().name
    }

    /// Attach `payloads` in order and return the finished payloads in
    /// reverse order.
    ///
    /// The first payload approves `(trunk, branch)`; each later one approves
    /// `(previous, trunk)`. An interrupt anywhere in the batch yields an empty
    /// result. Interrupts raised before this attach took the lock are
    /// cleared.
    pub fn attach(
        &self,
        trunk: Hash,
        branch: Hash,
        min_weight_magnitude: u8,
        payloads: &[String],
    ) -> ApiResult<Vec<String>> {
        let _guard = self.attach_lock.lock();
        self.pow.reset();

        check_difficulty(min_weight_magnitude).map_err(map_pow_error)?;
        for (i, payload) in payloads.iter().enumerate() {
            Transaction::from_trytes(payload)
                .map_err(|e| ApiError::invalid_parameter(format!("trytes[{}]: {}", i, e)))?;
        }

        let started = Instant::now();
        let mut finished = Vec::with_capacity(payloads.len());
        let mut previous: Option<Hash> = None;

        for (i, payload) in payloads.iter().enumerate() {
            let (t, b) = match previous {
                None => (trunk, branch),
                Some(prev) => (prev, trunk),
            };
            let candidate = Transaction::with_parents(payload, &t, &b)?;

            let found = if self.pow.is_cancelled() {
                None
            } else {
                self.pow
                    .search(&candidate, min_weight_magnitude)
                    .map_err(map_pow_error)?
            };
            let Some(found) = found else {
                info!(index = i, total = payloads.len(), "attach interrupted, batch discarded");
                return Ok(Vec::new());
            };

            let transaction = Transaction::from_trytes(&found).map_err(|e| {
                ApiError::internal(format!("proof-of-work returned a bad payload: {}", e))
            })?;
            debug!(index = i, hash = %transaction.hash(), "payload attached");
            previous = Some(transaction.hash());
            finished.push(found);
        }

        if self.pow.is_cancelled() {
            info!(total = payloads.len(), "attach interrupted, batch discarded");
            return Ok(Vec::new());
        }

        info!(
            count = finished.len(),
            mwm = min_weight_magnitude,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "attach finished"
        );
        finished.reverse();
        Ok(finished)
    }

    /// Cancel the running search, if any.
    pub fn interrupt(&self) {
        info!(engine = %self.engine_name(), "interrupting proof-of-work");
        self.pow.cancel();
    }
}

fn map_pow_error(e: PowError) -> ApiError {
    match e {
        PowError::WorkerPool(msg) => ApiError::internal(format!("proof-of-work: {}", msg)),
        other => ApiError::invalid_parameter(other.to_string()),
    }
}
