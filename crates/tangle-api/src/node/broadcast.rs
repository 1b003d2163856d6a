//! Outbound broadcast queue.
//!
//! `broadcastTransactions` only enqueues; whatever gossips to peers drains.
//! When full, the oldest entries are dropped to make room.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tangle_types::Transaction;
use tracing::warn;

#[derive(Debug)]
pub struct BroadcastQueue {
    queue: Mutex<VecDeque<Transaction>>,
    capacity: usize,
}

impl BroadcastQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Append transactions. Returns how many older entries were evicted.
    pub fn enqueue(&self, transactions: impl IntoIterator<Item = Transaction>) -> usize {
        let mut queue = self.queue.lock();
        let mut evicted = 0;
        for transaction in transactions {
            if queue.len() == self.capacity {
                queue.pop_front();
                evicted += 1;
            }
            queue.push_back(transaction);
        }
        if evicted > 0 {
            warn!(evicted, capacity = self.capacity, "broadcast queue full, dropped oldest");
        }
        evicted
    }

    /// Remove up to `max` transactions, oldest first.
    pub fn drain(&self, max: usize) -> Vec<Transaction> {
        let mut queue = self.queue.lock();
        let n = max.min(queue.len());
        queue.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_types::TransactionBuilder;

    fn tx(value: i64) -> Transaction {
        TransactionBuilder::new().value(value).build().unwrap()
    }

    #[test]
    fn test_fifo_drain() {
        let queue = BroadcastQueue::new(10);
        assert_eq!(queue.enqueue([tx(1), tx(2), tx(3)]), 0);
        let drained = queue.drain(2);
        assert_eq!(drained.iter().map(|t| t.value).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain(5).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let queue = BroadcastQueue::new(2);
        assert_eq!(queue.enqueue([tx(1), tx(2), tx(3), tx(4)]), 2);
        let values: Vec<i64> = queue.drain(10).iter().map(|t| t.value).collect();
        assert_eq!(values, vec![3, 4]);
    }
}
