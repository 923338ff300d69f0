//! Image metadata records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Tags attached to one image. Most images carry one or two.
pub type Tags = SmallVec<[String; 2]>;

/// Metadata for one pushed image
///
/// Records are plain values handed over by a registry listing. Tags may be
/// empty or repeat; neither is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Content digest (`sha256:...`), when the registry reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Tags pointing at this image
    #[serde(default)]
    pub tags: Tags,
    /// Push timestamp (missing values read as the Unix epoch)
    #[serde(default)]
    pub pushed_at: DateTime<Utc>,
    /// Compressed size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl ImageRecord {
    /// Create an untagged record pushed at the given time
    pub fn new(pushed_at: DateTime<Utc>) -> Self {
        Self {
            pushed_at,
            ..Self::default()
        }
    }

    /// Attach a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the content digest
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Set the reported size
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// True when no tag points at this image
    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }

    /// Identifiers that remove this image when passed to a delete call
    ///
    /// The digest removes the image in one go. Without a digest every
    /// distinct tag has to be removed; an image whose last tag is removed is
    /// gone. Returns an empty list for records that carry neither.
    pub fn ids(&self) -> Vec<ImageId> {
        if let Some(digest) = &self.digest {
            return vec![ImageId::Digest(digest.clone())];
        }

        let mut ids: Vec<ImageId> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let id = ImageId::Tag(tag.clone());
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl AsRef<ImageRecord> for ImageRecord {
    fn as_ref(&self) -> &ImageRecord {
        self
    }
}

/// Identifier used to delete an image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageId {
    /// Content digest
    Digest(String),
    /// Tag name
    Tag(String),
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageId::Digest(digest) => write!(f, "{}", digest),
            ImageId::Tag(tag) => write!(f, "tag:{}", tag),
        }
    }
}
