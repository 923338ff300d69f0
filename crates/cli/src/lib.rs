//! Tagreaper library surface
//!
//! Shared by the `reaper` binary and the integration tests:
//! - Configuration loading and validation
//! - In-use tag collection
//! - The cleanup pipeline (plan, then prune)
//! - Output formatting helpers

pub mod config;
pub mod in_use;
pub mod pipeline;
pub mod util;
