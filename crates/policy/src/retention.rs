//! Retention policies and deletion candidate selection

use crate::{sort_by_push_date, ImageRecord};
use ahash::AHashSet;
use chrono::{DateTime, Duration, Utc};
use std::borrow::Borrow;
use std::hash::Hash;

/// Select the images of one repository that may be deleted
///
/// Every image counts toward `keep_max`. Once the repository holds more
/// than `keep_max` images, the oldest images without an in-use tag are
/// selected until the excess is covered. Images carrying any in-use tag are
/// never selected, so they end up occupying kept slots instead.
///
/// The result references records of `images`, oldest first. The input
/// slice itself is not reordered.
pub fn select_old_unused_images<'a, I, S>(
    keep_max: usize,
    images: &'a [ImageRecord],
    tags_in_use: I,
) -> Vec<&'a ImageRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if images.len() <= keep_max {
        return Vec::new();
    }

    let in_use: AHashSet<String> = tags_in_use
        .into_iter()
        .map(|tag| tag.as_ref().to_owned())
        .collect();

    select_old_unused_images_in(keep_max, images, &in_use)
}

/// [`select_old_unused_images`] over an in-use set the caller already holds
///
/// Callers evaluating many repositories against the same tags build the
/// set once and pass it to every call.
pub fn select_old_unused_images_in<'a, S>(
    keep_max: usize,
    images: &'a [ImageRecord],
    in_use: &AHashSet<S>,
) -> Vec<&'a ImageRecord>
where
    S: Borrow<str> + Eq + Hash,
{
    let mut excess = images.len().saturating_sub(keep_max);
    if excess == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&ImageRecord> = images.iter().collect();
    sort_by_push_date(&mut sorted);

    let mut candidates = Vec::with_capacity(excess);
    for image in sorted {
        if excess == 0 {
            break;
        }
        if image.tags.iter().any(|tag| in_use.contains(tag.as_str())) {
            continue;
        }
        candidates.push(image);
        excess -= 1;
    }

    candidates
}

/// Retention policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Number of images to keep per repository (default: 10)
    pub keep_max: usize,
    /// Images pushed more recently than this are never deleted
    pub min_age: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_max: 10,
            min_age: None,
        }
    }
}

impl RetentionPolicy {
    /// Create a policy keeping `keep_max` images and no age guard
    pub fn new(keep_max: usize) -> Self {
        Self {
            keep_max,
            min_age: None,
        }
    }

    /// Protect images younger than `min_age`
    pub fn with_min_age(mut self, min_age: Duration) -> Self {
        self.min_age = Some(min_age);
        self
    }

    /// Deletion candidates for one repository at time `now`
    ///
    /// Runs [`select_old_unused_images`], then drops candidates pushed after
    /// `now - min_age`.
    pub fn evaluate<'a, I, S>(
        &self,
        images: &'a [ImageRecord],
        tags_in_use: I,
        now: DateTime<Utc>,
    ) -> Vec<&'a ImageRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let in_use: AHashSet<String> = tags_in_use
            .into_iter()
            .map(|tag| tag.as_ref().to_owned())
            .collect();

        self.evaluate_in(images, &in_use, now)
    }

    /// [`RetentionPolicy::evaluate`] over an in-use set the caller already holds
    pub fn evaluate_in<'a, S>(
        &self,
        images: &'a [ImageRecord],
        in_use: &AHashSet<S>,
        now: DateTime<Utc>,
    ) -> Vec<&'a ImageRecord>
    where
        S: Borrow<str> + Eq + Hash,
    {
        let mut candidates = select_old_unused_images_in(self.keep_max, images, in_use);

        if let Some(min_age) = self.min_age {
            let cutoff = now
                .checked_sub_signed(min_age)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            candidates.retain(|image| image.pushed_at <= cutoff);
        }

        candidates
    }
}
