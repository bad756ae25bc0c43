//! Resonator - integration test support.
//!
//! Re-exports the workspace crates so integration tests use
//! `resonator_test::component::` paths.

pub mod component {
    pub use resonator_core::*;
    pub use resonator_recur::*;
}
