//! # Tangle Types Crate
//!
//! Single source of truth for the values that cross crate boundaries:
//!
//! - **Trytes**: the 27-symbol alphabet, balanced-trit conversion and the
//!   signed integer encoding used by transaction fields.
//! - **Hash**: the 81-tryte identifier that names transactions, addresses and
//!   bundles at the API boundary.
//! - **Transaction**: the fixed-width payload layout and its derived hash.
//!
//! ## Design Principles
//!
//! - A transaction's hash is a pure function of its tryte payload.
//! - Parsing validates length and alphabet up front; a `Transaction` value is
//!   always well-formed.

pub mod errors;
pub mod hash;
pub mod transaction;
pub mod trytes;

pub use errors::CodecError;
pub use hash::{Hash, Tag, HASH_SIZE, NULL_HASH, TAG_SIZE};
pub use transaction::{layout, Transaction, TransactionBuilder, TRANSACTION_SIZE};
pub use trytes::TRYTE_ALPHABET;
