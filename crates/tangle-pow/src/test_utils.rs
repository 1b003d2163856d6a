//! Deterministic engines for tests.
//!
//! Enable with the `test-utils` feature flag.

use crate::{CancelFlag, EngineInfo, PowEngine, PowError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

fn info(name: &str) -> EngineInfo {
    EngineInfo {
        name: name.to_string(),
        threads: 1,
    }
}

/// Accepts every payload unchanged unless cancelled.
#[derive(Debug)]
pub struct AlwaysSucceedPow {
    info: EngineInfo,
    calls: AtomicUsize,
    cancelled: CancelFlag,
}

impl Default for AlwaysSucceedPow {
    fn default() -> Self {
        Self {
            info: info("always-succeed"),
            calls: AtomicUsize::new(0),
            cancelled: CancelFlag::default(),
        }
    }
}

impl AlwaysSucceedPow {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PowEngine for AlwaysSucceedPow {
    fn info(&self) -> &EngineInfo {
        &self.info
    }

    fn search(&self, trytes: &str, _: u8) -> Result<Option<String>, PowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.cancelled.is_set() {
            return Ok(None);
        }
        Ok(Some(trytes.to_string()))
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

/// Succeeds until the `k`-th call (zero-based), which reports no result.
#[derive(Debug)]
pub struct FailAtPow {
    info: EngineInfo,
    fail_at: usize,
    calls: AtomicUsize,
    cancelled: CancelFlag,
}

impl FailAtPow {
    pub fn new(fail_at: usize) -> Self {
        Self {
            info: info("fail-at"),
            fail_at,
            calls: AtomicUsize::new(0),
            cancelled: CancelFlag::default(),
        }
    }
}

impl PowEngine for FailAtPow {
    fn info(&self) -> &EngineInfo {
        &self.info
    }

    fn search(&self, trytes: &str, _: u8) -> Result<Option<String>, PowError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_at || self.cancelled.is_set() {
            return Ok(None);
        }
        Ok(Some(trytes.to_string()))
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

/// Completes call `k` (zero-based) and then cancels itself, as an interrupt
/// arriving right after that search returned would.
///
/// Its own searches never look at the flag.
#[derive(Debug)]
pub struct CancelAfterPow {
    info: EngineInfo,
    cancel_after: usize,
    calls: AtomicUsize,
    cancelled: CancelFlag,
}

impl CancelAfterPow {
    pub fn new(cancel_after: usize) -> Self {
        Self {
            info: info("cancel-after"),
            cancel_after,
            calls: AtomicUsize::new(0),
            cancelled: CancelFlag::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PowEngine for CancelAfterPow {
    fn info(&self) -> &EngineInfo {
        &self.info
    }

    fn search(&self, trytes: &str, _: u8) -> Result<Option<String>, PowError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.cancel_after {
            self.cancelled.cancel();
        }
        Ok(Some(trytes.to_string()))
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

/// Spins until cancelled, then reports no result.
#[derive(Debug)]
pub struct UntilCancelledPow {
    info: EngineInfo,
    started: AtomicBool,
    cancelled: CancelFlag,
}

impl Default for UntilCancelledPow {
    fn default() -> Self {
        Self {
            info: info("until-cancelled"),
            started: AtomicBool::new(false),
            cancelled: CancelFlag::default(),
        }
    }
}

impl UntilCancelledPow {
    /// Whether a search has begun.
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl PowEngine for UntilCancelledPow {
    fn info(&self) -> &EngineInfo {
        &self.info
    }

    fn search(&self, _: &str, _: u8) -> Result<Option<String>, PowError> {
        self.started.store(true, Ordering::SeqCst);
        while !self.cancelled.is_set() {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(None)
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
