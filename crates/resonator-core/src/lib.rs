//! Resonator base crate: configuration, errors, and shared display types.

pub mod config;
pub mod error;
pub mod types;
