//! # Ports
//!
//! The storage contract the API core depends on.

use crate::domain::entities::{Pointer, StoreOutcome, TransactionRecord};
use crate::domain::errors::StoreError;
use tangle_types::{Hash, Tag, Transaction};

/// Pointer-addressed transaction graph with secondary indices.
///
/// Implementations must allow concurrent reads and inserts through `&self`.
pub trait GraphStore: Send + Sync {
    /// Pointer for a hash, stored or placeholder.
    fn resolve(&self, hash: &Hash) -> Option<Pointer>;

    /// Record behind a pointer.
    fn load(&self, pointer: Pointer) -> Result<TransactionRecord, StoreError>;

    /// Insert a transaction. Idempotent by hash.
    fn store(&self, transaction: Transaction) -> Result<StoreOutcome, StoreError>;

    /// Pointers of transactions sent to `address`.
    fn address_pointers(&self, address: &Hash) -> Vec<Pointer>;

    /// Pointers of transactions in `bundle`.
    fn bundle_pointers(&self, bundle: &Hash) -> Vec<Pointer>;

    /// Pointers of transactions carrying `tag`.
    fn tag_pointers(&self, tag: &Tag) -> Vec<Pointer>;

    /// Pointers of transactions that reference `pointer` as trunk or branch.
    fn approver_pointers(&self, pointer: Pointer) -> Vec<Pointer>;

    /// Hashes of stored records nobody approves yet.
    fn tips(&self) -> Vec<Hash>;

    /// Highest pointer allocated so far.
    fn pointer_range(&self) -> u64;

    /// Number of placeholder records awaiting their payload.
    fn placeholder_count(&self) -> usize;

    /// Number of stored records, genesis included.
    fn stored_count(&self) -> usize;

    /// Resolve and load in one step.
    fn load_by_hash(&self, hash: &Hash) -> Result<Option<TransactionRecord>, StoreError> {
        match self.resolve(hash) {
            Some(pointer) => self.load(pointer).map(Some),
            None => Ok(None),
        }
    }

    /// Approvers of the transaction named by `hash`.
    fn approvers_of(&self, hash: &Hash) -> Vec<Pointer> {
        self.resolve(hash)
            .map(|pointer| self.approver_pointers(pointer))
            .unwrap_or_default()
    }
}
