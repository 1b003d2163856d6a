//! Domain layer: configuration, command registry, errors, request and
//! response shapes, and the shared state the handlers read.

pub mod access;
pub mod commands;
pub mod config;
pub mod error;
pub mod milestone;
pub mod requests;
pub mod responses;
pub mod scratchpad;
