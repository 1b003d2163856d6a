//! # In-Memory Graph Store
//!
//! Arena of slots behind a single `RwLock`. Slot `i` is pointer `i + 1`;
//! slot 0 is genesis.

use crate::domain::entities::{
    Pointer, RecordKind, StoreOutcome, TransactionRecord, GENESIS_POINTER,
};
use crate::domain::errors::StoreError;
use crate::ports::GraphStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tangle_types::{Hash, Tag, Transaction, NULL_HASH};
use tracing::{debug, trace};

#[derive(Debug)]
struct Slot {
    hash: Hash,
    kind: RecordKind,
    trunk: Pointer,
    branch: Pointer,
    transaction: Option<Arc<Transaction>>,
}

#[derive(Debug)]
struct Inner {
    slots: Vec<Slot>,
    by_hash: HashMap<Hash, Pointer>,
    addresses: HashMap<Hash, Vec<Pointer>>,
    bundles: HashMap<Hash, Vec<Pointer>>,
    tags: HashMap<Tag, Vec<Pointer>>,
    approvers: HashMap<Pointer, Vec<Pointer>>,
    placeholders: usize,
}

impl Inner {
    fn with_genesis() -> Self {
        let mut by_hash = HashMap::new();
        by_hash.insert(NULL_HASH, GENESIS_POINTER);
        Self {
            slots: vec![Slot {
                hash: NULL_HASH,
                kind: RecordKind::Stored,
                trunk: GENESIS_POINTER,
                branch: GENESIS_POINTER,
                transaction: None,
            }],
            by_hash,
            addresses: HashMap::new(),
            bundles: HashMap::new(),
            tags: HashMap::new(),
            approvers: HashMap::new(),
            placeholders: 0,
        }
    }

    fn allocate_placeholder(&mut self, hash: Hash) -> Pointer {
        let pointer = Pointer::from_slot(self.slots.len());
        self.slots.push(Slot {
            hash,
            kind: RecordKind::Placeholder,
            trunk: Pointer::NULL,
            branch: Pointer::NULL,
            transaction: None,
        });
        self.by_hash.insert(hash, pointer);
        self.placeholders += 1;
        trace!(pointer = %pointer, "allocated placeholder");
        pointer
    }

    fn resolve_or_placeholder(&mut self, hash: Hash) -> Pointer {
        match self.by_hash.get(&hash) {
            Some(pointer) => *pointer,
            None => self.allocate_placeholder(hash),
        }
    }

    fn slot(&self, pointer: Pointer) -> Result<&Slot, StoreError> {
        let index = pointer.slot().ok_or(StoreError::NullPointer)?;
        self.slots.get(index).ok_or(StoreError::OutOfRange {
            pointer,
            allocated: self.slots.len() as u64,
        })
    }

    fn has_approvers(&self, pointer: Pointer) -> bool {
        self.approvers.get(&pointer).is_some_and(|v| !v.is_empty())
    }
}

/// The node's default [`GraphStore`].
#[derive(Debug)]
pub struct InMemoryGraphStore {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraphStore {
    /// Unbounded store holding only genesis.
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Store that refuses to grow past `capacity` slots, genesis included.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::with_genesis()),
            capacity: capacity.max(1),
        }
    }
}

impl GraphStore for InMemoryGraphStore {
    fn resolve(&self, hash: &Hash) -> Option<Pointer> {
        self.inner.read().by_hash.get(hash).copied()
    }

    fn load(&self, pointer: Pointer) -> Result<TransactionRecord, StoreError> {
        let inner = self.inner.read();
        let slot = inner.slot(pointer)?;
        Ok(TransactionRecord {
            pointer,
            hash: slot.hash,
            kind: slot.kind,
            trunk_pointer: slot.trunk,
            branch_pointer: slot.branch,
            transaction: slot.transaction.clone(),
        })
    }

    fn store(&self, transaction: Transaction) -> Result<StoreOutcome, StoreError> {
        let hash = transaction.hash();
        let mut inner = self.inner.write();

        let existing = inner.by_hash.get(&hash).copied();
        if let Some(pointer) = existing {
            if inner.slot(pointer)?.kind == RecordKind::Stored {
                return Ok(StoreOutcome::AlreadyStored(pointer));
            }
        }

        let mut missing = vec![];
        for candidate in [hash, transaction.trunk, transaction.branch] {
            if !inner.by_hash.contains_key(&candidate) && !missing.contains(&candidate) {
                missing.push(candidate);
            }
        }
        if inner.slots.len() + missing.len() > self.capacity {
            return Err(StoreError::CapacityExhausted {
                capacity: self.capacity,
            });
        }

        let pointer = match existing {
            Some(pointer) => pointer,
            None => inner.allocate_placeholder(hash),
        };
        let trunk = inner.resolve_or_placeholder(transaction.trunk);
        let branch = inner.resolve_or_placeholder(transaction.branch);

        let index = pointer.slot().ok_or(StoreError::NullPointer)?;
        let allocated = inner.slots.len() as u64;
        let slot = inner
            .slots
            .get_mut(index)
            .ok_or(StoreError::OutOfRange { pointer, allocated })?;
        slot.kind = RecordKind::Stored;
        slot.trunk = trunk;
        slot.branch = branch;
        slot.transaction = Some(Arc::new(transaction.clone()));
        inner.placeholders -= 1;

        inner
            .addresses
            .entry(transaction.address)
            .or_default()
            .push(pointer);
        inner
            .bundles
            .entry(transaction.bundle)
            .or_default()
            .push(pointer);
        inner.tags.entry(transaction.tag).or_default().push(pointer);
        inner.approvers.entry(trunk).or_default().push(pointer);
        if branch != trunk {
            inner.approvers.entry(branch).or_default().push(pointer);
        }

        let outcome = if existing.is_some() {
            StoreOutcome::Materialized(pointer)
        } else {
            StoreOutcome::Inserted(pointer)
        };
        debug!(pointer = %pointer, hash = %hash, outcome = ?outcome, "stored transaction");
        Ok(outcome)
    }

    fn address_pointers(&self, address: &Hash) -> Vec<Pointer> {
        self.inner
            .read()
            .addresses
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    fn bundle_pointers(&self, bundle: &Hash) -> Vec<Pointer> {
        self.inner
            .read()
            .bundles
            .get(bundle)
            .cloned()
            .unwrap_or_default()
    }

    fn tag_pointers(&self, tag: &Tag) -> Vec<Pointer> {
        self.inner.read().tags.get(tag).cloned().unwrap_or_default()
    }

    fn approver_pointers(&self, pointer: Pointer) -> Vec<Pointer> {
        self.inner
            .read()
            .approvers
            .get(&pointer)
            .cloned()
            .unwrap_or_default()
    }

    fn tips(&self) -> Vec<Hash> {
        let inner = self.inner.read();
        inner
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.kind == RecordKind::Stored)
            .filter(|(index, _)| !inner.has_approvers(Pointer::from_slot(*index)))
            .map(|(_, slot)| slot.hash)
            .collect()
    }

    fn pointer_range(&self) -> u64 {
        self.inner.read().slots.len() as u64
    }

    fn placeholder_count(&self) -> usize {
        self.inner.read().placeholders
    }

    fn stored_count(&self) -> usize {
        let inner = self.inner.read();
        inner.slots.len() - inner.placeholders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_types::{TransactionBuilder, HASH_SIZE};

    fn addr(c: char) -> Hash {
        c.to_string().repeat(HASH_SIZE).parse().unwrap()
    }

    fn tx(trunk: Hash, branch: Hash, value: i64) -> Transaction {
        TransactionBuilder::new()
            .address(addr('A'))
            .value(value)
            .trunk(trunk)
            .branch(branch)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fresh_store_holds_genesis() {
        let store = InMemoryGraphStore::new();
        assert_eq!(store.resolve(&NULL_HASH), Some(GENESIS_POINTER));
        let genesis = store.load(GENESIS_POINTER).unwrap();
        assert_eq!(genesis.trunk_pointer, GENESIS_POINTER);
        assert_eq!(genesis.branch_pointer, GENESIS_POINTER);
        assert_eq!(genesis.value(), 0);
        assert_eq!(store.tips(), vec![NULL_HASH]);
        assert_eq!(store.pointer_range(), 1);
    }

    #[test]
    fn test_store_links_parents_and_updates_tips() {
        let store = InMemoryGraphStore::new();
        let a = tx(NULL_HASH, NULL_HASH, 0);
        let a_ptr = store.store(a.clone()).unwrap().pointer();
        let b = tx(a.hash(), NULL_HASH, 1);
        let b_ptr = store.store(b.clone()).unwrap().pointer();

        let record = store.load(b_ptr).unwrap();
        assert_eq!(record.trunk_pointer, a_ptr);
        assert_eq!(record.branch_pointer, GENESIS_POINTER);
        assert_eq!(store.tips(), vec![b.hash()]);
        assert_eq!(store.approvers_of(&a.hash()), vec![b_ptr]);
        assert_eq!(store.approver_pointers(GENESIS_POINTER).len(), 2);
    }

    #[test]
    fn test_store_is_idempotent() {
        let store = InMemoryGraphStore::new();
        let a = tx(NULL_HASH, NULL_HASH, 5);
        let first = store.store(a.clone()).unwrap();
        let second = store.store(a).unwrap();
        assert_eq!(second, StoreOutcome::AlreadyStored(first.pointer()));
        assert_eq!(store.address_pointers(&addr('A')).len(), 1);
    }

    #[test]
    fn test_unknown_parent_becomes_placeholder_then_materializes() {
        let store = InMemoryGraphStore::new();
        let parent = tx(NULL_HASH, NULL_HASH, 3);
        let child = tx(parent.hash(), NULL_HASH, 0);

        store.store(child).unwrap();
        assert_eq!(store.placeholder_count(), 1);
        let parent_ptr = store.resolve(&parent.hash()).unwrap();
        assert!(store.load(parent_ptr).unwrap().is_placeholder());
        // A placeholder is not a tip.
        assert!(!store.tips().contains(&parent.hash()));

        let outcome = store.store(parent).unwrap();
        assert_eq!(outcome, StoreOutcome::Materialized(parent_ptr));
        assert_eq!(store.placeholder_count(), 0);
        assert_eq!(store.load(parent_ptr).unwrap().value(), 3);
    }

    #[test]
    fn test_load_rejects_bad_pointers() {
        let store = InMemoryGraphStore::new();
        assert_eq!(store.load(Pointer::NULL).unwrap_err(), StoreError::NullPointer);
        assert!(matches!(
            store.load(Pointer::new(99)),
            Err(StoreError::OutOfRange { allocated: 1, .. })
        ));
    }

    #[test]
    fn test_capacity_exhausted() {
        let store = InMemoryGraphStore::with_capacity(2);
        store.store(tx(NULL_HASH, NULL_HASH, 1)).unwrap();
        let err = store.store(tx(NULL_HASH, NULL_HASH, 2)).unwrap_err();
        assert_eq!(err, StoreError::CapacityExhausted { capacity: 2 });
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = InMemoryGraphStore::new();
        std::thread::scope(|scope| {
            for worker in 0..4i64 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..25 {
                        store.store(tx(NULL_HASH, NULL_HASH, worker * 100 + i)).unwrap();
                    }
                });
            }
        });
        assert_eq!(store.stored_count(), 101);
        assert_eq!(store.tips().len(), 100);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parents_never_dangle(choices in prop::collection::vec((0usize..64, 0usize..64), 1..40)) {
                let store = InMemoryGraphStore::new();
                let mut hashes = vec![NULL_HASH];
                for (i, (t, b)) in choices.iter().enumerate() {
                    let trunk = hashes[t % hashes.len()];
                    let branch = hashes[b % hashes.len()];
                    let next = tx(trunk, branch, i as i64 + 1);
                    hashes.push(next.hash());
                    store.store(next).unwrap();
                }
                for raw in 1..=store.pointer_range() {
                    let record = store.load(Pointer::new(raw)).unwrap();
                    if record.is_placeholder() {
                        continue;
                    }
                    prop_assert!(store.load(record.trunk_pointer).is_ok());
                    prop_assert!(store.load(record.branch_pointer).is_ok());
                }
                for tip in store.tips() {
                    prop_assert!(store.approvers_of(&tip).is_empty());
                }
            }
        }
    }
}
