//! Graph walks: inclusion states and confirmed balances.
//!
//! Both walks are breadth-first over trunk and branch edges and hold the
//! shared [`VisitedScratchpad`] for their whole duration.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::milestone::{MilestoneRef, Snapshot};
use crate::domain::scratchpad::VisitedScratchpad;
use std::collections::{HashMap, VecDeque};
use tangle_storage::{GraphStore, Pointer};
use tangle_types::Hash;
use tracing::debug;

/// Result of a balance walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// One entry per requested address, in request order.
    pub balances: Vec<i64>,
    /// Milestone the walk started from.
    pub milestone: MilestoneRef,
}

/// Walks over a [`GraphStore`].
pub struct DagTraversal<'a> {
    store: &'a dyn GraphStore,
    scratchpad: &'a VisitedScratchpad,
}

impl<'a> DagTraversal<'a> {
    pub fn new(store: &'a dyn GraphStore, scratchpad: &'a VisitedScratchpad) -> Self {
        Self { store, scratchpad }
    }

    /// For each target, whether it is reachable from any of `tips`.
    ///
    /// Fails with `TipNotFound` if a tip is unknown, and with
    /// `IncompleteSubgraph` if the walk reaches a placeholder before every
    /// target is found.
    pub fn inclusion_states(&self, targets: &[Hash], tips: &[Hash]) -> ApiResult<Vec<bool>> {
        let mut seeds = Vec::with_capacity(tips.len());
        for tip in tips {
            let pointer = self
                .store
                .resolve(tip)
                .ok_or_else(|| ApiError::tip_not_found(tip))?;
            seeds.push(pointer);
        }

        let mut states: HashMap<Hash, bool> = targets.iter().map(|t| (*t, false)).collect();
        let mut unmatched = states.len();
        if unmatched == 0 {
            return Ok(Vec::new());
        }

        let mut visited = self.scratchpad.acquire(self.store.pointer_range());
        let mut queue: VecDeque<Pointer> = seeds.into();

        while let Some(pointer) = queue.pop_front() {
            if !visited.mark(pointer) {
                continue;
            }
            let record = self.store.load(pointer)?;
            if record.is_placeholder() {
                return Err(ApiError::incomplete_subgraph(&record.hash));
            }
            if let Some(found) = states.get_mut(&record.hash) {
                if !*found {
                    *found = true;
                    unmatched -= 1;
                    if unmatched == 0 {
                        break;
                    }
                }
            }
            queue.push_back(record.trunk_pointer);
            queue.push_back(record.branch_pointer);
        }

        debug!(
            targets = states.len(),
            matched = states.len() - unmatched,
            visited = visited.visited_count(),
            "inclusion walk finished"
        );

        Ok(targets
            .iter()
            .map(|t| states.get(t).copied().unwrap_or(false))
            .collect())
    }

    /// Snapshot balances plus every value transfer reachable from
    /// `milestone`.
    pub fn balances(
        &self,
        addresses: &[Hash],
        threshold: i64,
        milestone: MilestoneRef,
        snapshot: &Snapshot,
    ) -> ApiResult<BalanceReport> {
        if threshold <= 0 || threshold > 100 {
            return Err(ApiError::invalid_threshold(threshold));
        }

        let mut totals: HashMap<Hash, i64> = addresses
            .iter()
            .map(|a| (*a, snapshot.balance(a)))
            .collect();

        let start = self
            .store
            .resolve(&milestone.hash)
            .ok_or_else(|| ApiError::incomplete_subgraph(&milestone.hash))?;

        let mut visited = self.scratchpad.acquire(self.store.pointer_range());
        let mut queue = VecDeque::from([start]);

        while let Some(pointer) = queue.pop_front() {
            if !visited.mark(pointer) {
                continue;
            }
            let record = self.store.load(pointer)?;
            if record.is_placeholder() {
                return Err(ApiError::incomplete_subgraph(&record.hash));
            }
            let value = record.value();
            if value != 0 {
                if let Some(total) = record.address().and_then(|a| totals.get_mut(a)) {
                    *total = total
                        .checked_add(value)
                        .ok_or_else(|| ApiError::internal("balance overflow"))?;
                }
            }
            queue.push_back(record.trunk_pointer);
            queue.push_back(record.branch_pointer);
        }

        debug!(
            addresses = totals.len(),
            visited = visited.visited_count(),
            milestone = milestone.index,
            "balance walk finished"
        );

        Ok(BalanceReport {
            balances: addresses
                .iter()
                .map(|a| totals.get(a).copied().unwrap_or(0))
                .collect(),
            milestone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use tangle_storage::InMemoryGraphStore;
    use tangle_types::{Transaction, TransactionBuilder, HASH_SIZE, NULL_HASH};

    fn hash(c: char) -> Hash {
        c.to_string().repeat(HASH_SIZE).parse().unwrap()
    }

    fn tx(address: Hash, value: i64, trunk: Hash, branch: Hash) -> Transaction {
        TransactionBuilder::new()
            .address(address)
            .value(value)
            .trunk(trunk)
            .branch(branch)
            .build()
            .unwrap()
    }

    struct Fixture {
        store: InMemoryGraphStore,
        pad: VisitedScratchpad,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: InMemoryGraphStore::new(),
                pad: VisitedScratchpad::new(),
            }
        }

        fn put(&self, tx: Transaction) -> Hash {
            let hash = tx.hash();
            self.store.store(tx).unwrap();
            hash
        }

        fn walk(&self) -> DagTraversal<'_> {
            DagTraversal::new(&self.store, &self.pad)
        }
    }

    #[test]
    fn test_target_equal_to_tip_is_included() {
        let f = Fixture::new();
        let a = f.put(tx(hash('A'), 0, NULL_HASH, NULL_HASH));
        assert_eq!(f.walk().inclusion_states(&[a], &[a]).unwrap(), vec![true]);
    }

    #[test]
    fn test_inclusion_over_chain() {
        let f = Fixture::new();
        let a = f.put(tx(hash('A'), 0, NULL_HASH, NULL_HASH));
        let b = f.put(tx(hash('B'), 0, a, NULL_HASH));
        let c = f.put(tx(hash('C'), 0, NULL_HASH, NULL_HASH));

        let states = f.walk().inclusion_states(&[a, c, a, NULL_HASH], &[b]).unwrap();
        assert_eq!(states, vec![true, false, true, true]);
        // Walking from A cannot reach B.
        assert_eq!(f.walk().inclusion_states(&[b], &[a]).unwrap(), vec![false]);
    }

    #[test]
    fn test_unknown_tip_fails_whole_call() {
        let f = Fixture::new();
        let a = f.put(tx(hash('A'), 0, NULL_HASH, NULL_HASH));
        let err = f
            .walk()
            .inclusion_states(&[a], &[a, hash('Q')])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TipNotFound);
    }

    #[test]
    fn test_placeholder_reports_incomplete_subgraph() {
        let f = Fixture::new();
        let missing = tx(hash('M'), 0, NULL_HASH, NULL_HASH);
        let child = f.put(tx(hash('A'), 0, missing.hash(), NULL_HASH));
        let err = f
            .walk()
            .inclusion_states(&[hash('Z')], &[child])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteSubgraph);
    }

    #[test]
    fn test_empty_targets() {
        let f = Fixture::new();
        assert!(f.walk().inclusion_states(&[], &[NULL_HASH]).unwrap().is_empty());
    }

    #[test]
    fn test_balance_threshold_bounds() {
        let f = Fixture::new();
        let snapshot = Snapshot::default();
        for bad in [0, -5, 101] {
            let err = f
                .walk()
                .balances(&[hash('A')], bad, MilestoneRef::START, &snapshot)
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidThreshold);
        }
        for good in [1, 100] {
            assert!(f
                .walk()
                .balances(&[hash('A')], good, MilestoneRef::START, &snapshot)
                .is_ok());
        }
    }

    #[test]
    fn test_genesis_only_returns_snapshot() {
        let f = Fixture::new();
        let snapshot = Snapshot::new([(hash('A'), 500)].into_iter().collect());
        let report = f
            .walk()
            .balances(&[hash('A'), hash('B')], 100, MilestoneRef::START, &snapshot)
            .unwrap();
        assert_eq!(report.balances, vec![500, 0]);
        assert_eq!(report.milestone, MilestoneRef::START);
    }

    #[test]
    fn test_balances_sum_reachable_transfers_once() {
        let f = Fixture::new();
        let a = f.put(tx(hash('A'), 30, NULL_HASH, NULL_HASH));
        let b = f.put(tx(hash('B'), -10, a, a));
        let m = f.put(tx(hash('A'), 5, b, a));
        // Not reachable from the milestone.
        f.put(tx(hash('A'), 1_000, NULL_HASH, NULL_HASH));

        let milestone = MilestoneRef { hash: m, index: 3 };
        let report = f
            .walk()
            .balances(
                &[hash('A'), hash('B'), hash('A')],
                100,
                milestone,
                &Snapshot::default(),
            )
            .unwrap();
        assert_eq!(report.balances, vec![35, -10, 35]);
        assert_eq!(report.milestone.index, 3);
    }

    #[test]
    fn test_unknown_milestone_is_incomplete() {
        let f = Fixture::new();
        let err = f
            .walk()
            .balances(
                &[hash('A')],
                100,
                MilestoneRef { hash: hash('X'), index: 1 },
                &Snapshot::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteSubgraph);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn balances_do_not_depend_on_address_order(
                values in prop::collection::vec((0usize..4, -50i64..50), 1..25),
                rotation in 0usize..4,
            ) {
                let f = Fixture::new();
                let addresses = [hash('A'), hash('B'), hash('C'), hash('D')];
                let mut last = NULL_HASH;
                for (slot, value) in &values {
                    last = f.put(tx(addresses[*slot], *value, last, NULL_HASH));
                }
                let milestone = MilestoneRef { hash: last, index: 1 };

                let mut rotated = addresses.to_vec();
                rotated.rotate_left(rotation);

                let snapshot = Snapshot::default();
                let base = f.walk().balances(&addresses, 100, milestone, &snapshot).unwrap();
                let other = f.walk().balances(&rotated, 100, milestone, &snapshot).unwrap();

                for (i, address) in rotated.iter().enumerate() {
                    let j = addresses.iter().position(|a| a == address).unwrap();
                    prop_assert_eq!(other.balances[i], base.balances[j]);
                }

                let expected: i64 = values.iter().filter(|(s, _)| *s == 0).map(|(_, v)| v).sum();
                prop_assert_eq!(base.balances[0], expected);
            }
        }
    }
}
