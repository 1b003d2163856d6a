//! # Entities
//!
//! Pointers and the records they address.

use std::fmt;
use std::sync::Arc;
use tangle_types::{Hash, Transaction};

/// Opaque handle into the store. `0` means "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pointer(u64);

impl Pointer {
    /// The absent pointer.
    pub const NULL: Pointer = Pointer(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Arena index for a non-null pointer.
    pub(crate) fn slot(self) -> Option<usize> {
        self.0.checked_sub(1).map(|i| i as usize)
    }

    pub(crate) fn from_slot(index: usize) -> Self {
        Self(index as u64 + 1)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pointer of the genesis record.
pub const GENESIS_POINTER: Pointer = Pointer(1);

/// Whether the payload behind a record has been received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Payload stored; parents resolved.
    Stored,
    /// Referenced by another transaction but not yet fetched.
    Placeholder,
}

/// A transaction as seen through the store.
///
/// Placeholders carry no payload and null parent pointers. The genesis
/// record is `Stored` without a payload and points at itself.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub pointer: Pointer,
    pub hash: Hash,
    pub kind: RecordKind,
    pub trunk_pointer: Pointer,
    pub branch_pointer: Pointer,
    pub transaction: Option<Arc<Transaction>>,
}

impl TransactionRecord {
    pub fn is_placeholder(&self) -> bool {
        self.kind == RecordKind::Placeholder
    }

    pub fn address(&self) -> Option<&Hash> {
        self.transaction.as_deref().map(|tx| &tx.address)
    }

    /// Signed value moved by this transaction; zero without a payload.
    pub fn value(&self) -> i64 {
        self.transaction.as_deref().map_or(0, |tx| tx.value)
    }

    pub fn trytes(&self) -> Option<&str> {
        self.transaction.as_deref().map(Transaction::trytes)
    }
}

/// What [`crate::GraphStore::store`] did with a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// New slot allocated.
    Inserted(Pointer),
    /// A placeholder slot received its payload.
    Materialized(Pointer),
    /// The hash was already fully stored; nothing changed.
    AlreadyStored(Pointer),
}

impl StoreOutcome {
    pub fn pointer(self) -> Pointer {
        match self {
            Self::Inserted(p) | Self::Materialized(p) | Self::AlreadyStored(p) => p,
        }
    }

    pub fn is_new(self) -> bool {
        !matches!(self, Self::AlreadyStored(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_slot_mapping() {
        assert_eq!(Pointer::NULL.slot(), None);
        assert_eq!(GENESIS_POINTER.slot(), Some(0));
        assert_eq!(Pointer::from_slot(4), Pointer::new(5));
    }

    #[test]
    fn test_outcome_pointer() {
        let p = Pointer::new(9);
        assert_eq!(StoreOutcome::Materialized(p).pointer(), p);
        assert!(StoreOutcome::Inserted(p).is_new());
        assert!(!StoreOutcome::AlreadyStored(p).is_new());
    }
}
