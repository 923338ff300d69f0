//! Common utilities for integration tests

pub mod cli;

// Re-export commonly used items
#[allow(unused_imports)]
pub use fixtures::{image, sample_inventory, TestRegistry};
