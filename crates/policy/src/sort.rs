//! Chronological ordering of image records

use crate::ImageRecord;

/// Sort images by push date, oldest first
///
/// Accepts owned records as well as references to records. Images pushed at
/// the same instant may end up in either order.
pub fn sort_by_push_date<T: AsRef<ImageRecord>>(images: &mut [T]) {
    images.sort_unstable_by_key(|image| image.as_ref().pushed_at);
}
