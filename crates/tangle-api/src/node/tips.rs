//! Tip selection for `getTransactionsToApprove`.
//!
//! Steps back `depth` trunk edges from the solid milestone, then walks
//! forward along approver edges at random until it reaches a transaction
//! nobody approves. Trunk and branch come from two independent walks.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::milestone::MilestoneRef;
use rand::seq::SliceRandom;
use rand::Rng;
use tangle_storage::{GraphStore, Pointer};
use tangle_types::Hash;
use tracing::debug;

/// Pair of tips to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipPair {
    pub trunk: Hash,
    pub branch: Hash,
}

pub struct TipSelector<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> TipSelector<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        milestone: MilestoneRef,
        depth: u32,
        rng: &mut R,
    ) -> ApiResult<TipPair> {
        let entry = self.entry_point(milestone, depth)?;
        let trunk = self.walk(entry, rng)?;
        let branch = self.walk(entry, rng)?;
        debug!(depth, %trunk, %branch, "selected tips");
        Ok(TipPair { trunk, branch })
    }

    fn entry_point(&self, milestone: MilestoneRef, depth: u32) -> ApiResult<Pointer> {
        let mut current = self
            .store
            .resolve(&milestone.hash)
            .ok_or_else(ApiError::not_solid)?;
        let mut record = self.store.load(current)?;
        if record.is_placeholder() {
            return Err(ApiError::not_solid());
        }

        for _ in 0..depth {
            let trunk = record.trunk_pointer;
            if trunk == current {
                break;
            }
            let parent = self.store.load(trunk)?;
            if parent.is_placeholder() {
                break;
            }
            current = trunk;
            record = parent;
        }
        Ok(current)
    }

    fn walk<R: Rng + ?Sized>(&self, start: Pointer, rng: &mut R) -> ApiResult<Hash> {
        let mut current = start;
        // Approver paths are acyclic, so no walk is longer than the range.
        let limit = self.store.pointer_range() + 1;
        for _ in 0..=limit {
            let approvers = self.store.approver_pointers(current);
            match approvers.choose(rng) {
                Some(next) => current = *next,
                None => return Ok(self.store.load(current)?.hash),
            }
        }
        Err(ApiError::internal("tip walk did not terminate"))
    }
}
