//! # Tangle Storage
//!
//! The transaction graph the API core reads and writes.
//!
//! ## Model
//!
//! Every transaction lives in an arena slot addressed by a [`Pointer`].
//! Parents are stored as pointers, so a walk over the graph never hashes.
//! A parent that has been referenced but not yet received occupies a
//! placeholder slot until its payload arrives.
//!
//! ```text
//!   pointer 1: genesis (NULL_HASH, parents = itself)
//!   pointer 2: A  -> trunk 1, branch 1
//!   pointer 3: B  -> trunk 2, branch 1
//!   pointer 4: ?  (placeholder, referenced by someone, not yet stored)
//! ```
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - records, pointers and errors
//! - `ports/` - the [`GraphStore`] trait the API layer depends on
//! - `adapters/` - [`InMemoryGraphStore`]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryGraphStore;
pub use domain::entities::{Pointer, RecordKind, StoreOutcome, TransactionRecord, GENESIS_POINTER};
pub use domain::errors::StoreError;
pub use ports::GraphStore;
