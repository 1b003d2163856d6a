//! Ports the node depends on beyond storage and proof-of-work.

pub mod outbound;
