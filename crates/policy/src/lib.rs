//! Retention decisions for container image cleanup
//!
//! This crate provides:
//! - Image metadata records
//! - Chronological ordering by push date
//! - Deletion candidate selection (retention count + in-use tags)
//! - Retention policy configuration

pub mod image;
pub mod retention;
pub mod sort;

// Re-exports
pub use image::{ImageId, ImageRecord, Tags};
pub use retention::{select_old_unused_images, select_old_unused_images_in, RetentionPolicy};
pub use sort::sort_by_push_date;
