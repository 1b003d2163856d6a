//! Milestone references and the initial balance snapshot.
//!
//! The API only reads milestones; whatever computes them calls
//! [`MilestoneTracker::update_latest`] and [`MilestoneTracker::update_solid`].

use parking_lot::RwLock;
use std::collections::HashMap;
use tangle_types::{Hash, NULL_HASH};
use tracing::info;

/// Index a node starts from before any milestone has been solidified.
pub const MILESTONE_START_INDEX: u64 = 0;

/// A confirmed checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneRef {
    pub hash: Hash,
    pub index: u64,
}

impl MilestoneRef {
    pub const START: MilestoneRef = MilestoneRef {
        hash: NULL_HASH,
        index: MILESTONE_START_INDEX,
    };
}

#[derive(Debug)]
struct MilestoneState {
    latest: MilestoneRef,
    solid: MilestoneRef,
}

/// Latest and latest-solid milestone.
#[derive(Debug)]
pub struct MilestoneTracker {
    state: RwLock<MilestoneState>,
}

impl Default for MilestoneTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MilestoneState {
                latest: MilestoneRef::START,
                solid: MilestoneRef::START,
            }),
        }
    }

    pub fn latest(&self) -> MilestoneRef {
        self.state.read().latest
    }

    pub fn latest_solid(&self) -> MilestoneRef {
        self.state.read().solid
    }

    /// Whether the solid milestone has moved past the start index.
    pub fn is_solid(&self) -> bool {
        self.latest_solid().index != MILESTONE_START_INDEX
    }

    /// Record a newer latest milestone. Older indices are ignored.
    pub fn update_latest(&self, milestone: MilestoneRef) -> bool {
        let mut state = self.state.write();
        if milestone.index <= state.latest.index && state.latest.index != MILESTONE_START_INDEX {
            return false;
        }
        state.latest = milestone;
        info!(index = milestone.index, hash = %milestone.hash, "latest milestone changed");
        true
    }

    /// Record a newer solid milestone. Older indices are ignored.
    pub fn update_solid(&self, milestone: MilestoneRef) -> bool {
        let mut state = self.state.write();
        if milestone.index <= state.solid.index && state.solid.index != MILESTONE_START_INDEX {
            return false;
        }
        state.solid = milestone;
        if milestone.index > state.latest.index {
            state.latest = milestone;
        }
        info!(index = milestone.index, hash = %milestone.hash, "solid milestone changed");
        true
    }
}

/// Balances every address held before the graph began.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    balances: HashMap<Hash, i64>,
}

impl Snapshot {
    pub fn new(balances: HashMap<Hash, i64>) -> Self {
        Self { balances }
    }

    /// Build from address trytes. Invalid keys are rejected.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, tangle_types::CodecError>
    where
        I: IntoIterator<Item = (&'a String, &'a i64)>,
    {
        let mut balances = HashMap::new();
        for (address, balance) in entries {
            balances.insert(address.parse()?, *balance);
        }
        Ok(Self { balances })
    }

    pub fn balance(&self, address: &Hash) -> i64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_types::HASH_SIZE;

    fn hash(c: char) -> Hash {
        c.to_string().repeat(HASH_SIZE).parse().unwrap()
    }

    #[test]
    fn test_fresh_tracker_is_not_solid() {
        let tracker = MilestoneTracker::new();
        assert!(!tracker.is_solid());
        assert_eq!(tracker.latest_solid(), MilestoneRef::START);
    }

    #[test]
    fn test_solid_updates_are_monotonic() {
        let tracker = MilestoneTracker::new();
        assert!(tracker.update_solid(MilestoneRef { hash: hash('A'), index: 5 }));
        assert!(tracker.is_solid());
        assert_eq!(tracker.latest().index, 5);

        assert!(!tracker.update_solid(MilestoneRef { hash: hash('B'), index: 4 }));
        assert_eq!(tracker.latest_solid().hash, hash('A'));

        assert!(tracker.update_latest(MilestoneRef { hash: hash('C'), index: 9 }));
        assert_eq!(tracker.latest_solid().index, 5);
    }

    #[test]
    fn test_snapshot_defaults_to_zero() {
        let entries: HashMap<String, i64> = [(hash('A').to_string(), 100)].into_iter().collect();
        let snapshot = Snapshot::from_entries(&entries).unwrap();
        assert_eq!(snapshot.balance(&hash('A')), 100);
        assert_eq!(snapshot.balance(&hash('B')), 0);

        let bad: HashMap<String, i64> = [("abc".to_string(), 1)].into_iter().collect();
        assert!(Snapshot::from_entries(&bad).is_err());
    }
}
