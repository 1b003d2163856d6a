//! # Transaction Layout
//!
//! A transaction is a fixed-width tryte string. Fields sit at fixed offsets:
//!
//! | Field     | Offset | Width |
//! |-----------|--------|-------|
//! | address   | 0      | 81    |
//! | value     | 81     | 27    |
//! | tag       | 108    | 27    |
//! | timestamp | 135    | 9     |
//! | bundle    | 144    | 81    |
//! | trunk     | 225    | 81    |
//! | branch    | 306    | 81    |
//! | nonce     | 387    | 27    |
//!
//! The hash covers the whole payload, nonce included, so proof-of-work
//! searches by rewriting the nonce field.

use crate::errors::CodecError;
use crate::hash::{Hash, Tag, HASH_SIZE};
use crate::trytes;
use std::ops::Range;

/// Field offsets within the payload.
pub mod layout {
    use std::ops::Range;

    pub const ADDRESS: Range<usize> = 0..81;
    pub const VALUE: Range<usize> = 81..108;
    pub const TAG: Range<usize> = 108..135;
    pub const TIMESTAMP: Range<usize> = 135..144;
    pub const BUNDLE: Range<usize> = 144..225;
    pub const TRUNK: Range<usize> = 225..306;
    pub const BRANCH: Range<usize> = 306..387;
    pub const NONCE: Range<usize> = 387..414;
}

/// Width of a transaction payload in trytes.
pub const TRANSACTION_SIZE: usize = layout::NONCE.end;

/// A parsed transaction payload with its derived hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    trytes: String,
    hash: Hash,
    pub address: Hash,
    pub value: i64,
    pub tag: Tag,
    pub timestamp: u64,
    pub bundle: Hash,
    pub trunk: Hash,
    pub branch: Hash,
}

impl Transaction {
    /// Parse and hash a payload.
    pub fn from_trytes(input: &str) -> Result<Self, CodecError> {
        if input.len() != TRANSACTION_SIZE {
            return Err(CodecError::InvalidLength {
                expected: TRANSACTION_SIZE,
                actual: input.len(),
            });
        }
        trytes::validate(input)?;
        let bytes = input.as_bytes();

        let timestamp = trytes::decode_i64(&bytes[layout::TIMESTAMP], "timestamp")?;

        Ok(Self {
            hash: Hash::digest(bytes),
            address: Hash::from_trytes(&bytes[layout::ADDRESS])?,
            value: trytes::decode_i64(&bytes[layout::VALUE], "value")?,
            tag: Tag::from_trytes(&bytes[layout::TAG])?,
            timestamp: u64::try_from(timestamp)
                .map_err(|_| CodecError::ValueOutOfRange { field: "timestamp" })?,
            bundle: Hash::from_trytes(&bytes[layout::BUNDLE])?,
            trunk: Hash::from_trytes(&bytes[layout::TRUNK])?,
            branch: Hash::from_trytes(&bytes[layout::BRANCH])?,
            trytes: input.to_string(),
        })
    }

    /// The derived hash.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// The canonical payload.
    pub fn trytes(&self) -> &str {
        &self.trytes
    }

    /// Proof-of-work weight achieved by this payload.
    pub fn weight_magnitude(&self) -> u8 {
        self.hash.weight_magnitude()
    }

    /// Nonce trytes.
    pub fn nonce(&self) -> &str {
        &self.trytes[layout::NONCE]
    }

    /// Overwrite the trunk and branch fields of a raw payload.
    ///
    /// The payload must already be [`TRANSACTION_SIZE`] valid trytes.
    pub fn with_parents(input: &str, trunk: &Hash, branch: &Hash) -> Result<String, CodecError> {
        if input.len() != TRANSACTION_SIZE {
            return Err(CodecError::InvalidLength {
                expected: TRANSACTION_SIZE,
                actual: input.len(),
            });
        }
        trytes::validate(input)?;
        let mut bytes = input.as_bytes().to_vec();
        splice(&mut bytes, layout::TRUNK, trunk.as_trytes());
        splice(&mut bytes, layout::BRANCH, branch.as_trytes());
        Ok(bytes.into_iter().map(char::from).collect())
    }
}

fn splice(target: &mut [u8], range: Range<usize>, source: &[u8]) {
    target[range].copy_from_slice(source);
}

/// Builder for payloads, used by tests and tooling.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    address: Hash,
    value: i64,
    tag: Tag,
    timestamp: u64,
    bundle: Hash,
    trunk: Hash,
    branch: Hash,
    nonce: [u8; 27],
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self {
            address: crate::NULL_HASH,
            value: 0,
            tag: Tag::EMPTY,
            timestamp: 0,
            bundle: crate::NULL_HASH,
            trunk: crate::NULL_HASH,
            branch: crate::NULL_HASH,
            nonce: [b'9'; 27],
        }
    }
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: Hash) -> Self {
        self.address = address;
        self
    }

    pub fn value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn bundle(mut self, bundle: Hash) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn trunk(mut self, trunk: Hash) -> Self {
        self.trunk = trunk;
        self
    }

    pub fn branch(mut self, branch: Hash) -> Self {
        self.branch = branch;
        self
    }

    /// Assemble the payload string.
    pub fn to_trytes(&self) -> String {
        let mut bytes = vec![b'9'; TRANSACTION_SIZE];
        splice(&mut bytes, layout::ADDRESS, self.address.as_trytes());
        splice(
            &mut bytes,
            layout::VALUE,
            &trytes::encode_i64(self.value, layout::VALUE.len()),
        );
        splice(&mut bytes, layout::TAG, self.tag.as_trytes());
        splice(
            &mut bytes,
            layout::TIMESTAMP,
            &trytes::encode_i64(self.timestamp as i64, layout::TIMESTAMP.len()),
        );
        splice(&mut bytes, layout::BUNDLE, self.bundle.as_trytes());
        splice(&mut bytes, layout::TRUNK, self.trunk.as_trytes());
        splice(&mut bytes, layout::BRANCH, self.branch.as_trytes());
        splice(&mut bytes, layout::NONCE, &self.nonce);
        // Every spliced slice is alphabet-only.
        bytes.into_iter().map(char::from).collect()
    }

    /// Assemble and parse.
    pub fn build(&self) -> Result<Transaction, CodecError> {
        Transaction::from_trytes(&self.to_trytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NULL_HASH;

    fn h(c: char) -> Hash {
        c.to_string().repeat(HASH_SIZE).parse().unwrap()
    }

    #[test]
    fn test_builder_fields_survive_parse() {
        let tx = TransactionBuilder::new()
            .address(h('A'))
            .value(-42)
            .tag(Tag::padded("DAG").unwrap())
            .timestamp(1_700_000_000)
            .bundle(h('B'))
            .trunk(h('C'))
            .branch(h('D'))
            .build()
            .unwrap();

        assert_eq!(tx.address, h('A'));
        assert_eq!(tx.value, -42);
        assert_eq!(tx.tag, Tag::padded("DAG").unwrap());
        assert_eq!(tx.timestamp, 1_700_000_000);
        assert_eq!(tx.bundle, h('B'));
        assert_eq!(tx.trunk, h('C'));
        assert_eq!(tx.branch, h('D'));
        assert_eq!(tx.trytes().len(), TRANSACTION_SIZE);
    }

    #[test]
    fn test_hash_depends_on_payload() {
        let a = TransactionBuilder::new().value(1).build().unwrap();
        let b = TransactionBuilder::new().value(2).build().unwrap();
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), Transaction::from_trytes(a.trytes()).unwrap().hash());
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(matches!(
            Transaction::from_trytes("ABC"),
            Err(CodecError::InvalidLength { expected: TRANSACTION_SIZE, actual: 3 })
        ));
    }

    #[test]
    fn test_with_parents_rewrites_only_parent_fields() {
        let original = TransactionBuilder::new().address(h('Q')).value(7).to_trytes();
        let rewritten = Transaction::with_parents(&original, &h('T'), &h('U')).unwrap();
        let tx = Transaction::from_trytes(&rewritten).unwrap();
        assert_eq!(tx.trunk, h('T'));
        assert_eq!(tx.branch, h('U'));
        assert_eq!(tx.address, h('Q'));
        assert_eq!(tx.value, 7);
        assert_ne!(tx.trunk, NULL_HASH);
    }
}
