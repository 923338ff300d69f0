//! Registry access for image cleanup
//!
//! This crate provides:
//! - The `RegistryClient` trait (paged listing, batched deletion)
//! - An in-memory registry
//! - A registry backed by a JSON inventory file
//! - Registry error types

pub mod client;
pub mod error;
pub mod inventory;
pub mod memory;

// Re-exports
pub use client::{DeleteFailure, DeleteOutcome, Page, PageToken, RegistryClient, Repository};
pub use error::RegistryError;
pub use inventory::{Inventory, InventoryRegistry, InventoryRepository};
pub use memory::MemoryRegistry;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
