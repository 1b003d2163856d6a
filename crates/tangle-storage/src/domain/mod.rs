//! Domain layer: records and errors.

pub mod entities;
pub mod errors;
