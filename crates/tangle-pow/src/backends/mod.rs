//! PoW backends

#[cfg(feature = "cpu")]
pub mod cpu;
