//! Registry client abstraction
//!
//! Backends only implement single-page listings and a delete call. The
//! provided `list_*` methods walk continuation tokens until the listing is
//! exhausted, so callers always see a materialized sequence.

use crate::{RegistryError, Result};
use ahash::AHashSet;
use async_trait::async_trait;
use policy::{ImageId, ImageRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Continuation token returned by a paged listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(pub String);

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the following page, `None` on the last one
    pub next: Option<PageToken>,
}

/// An image repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: None,
        }
    }
}

/// An identifier the registry refused to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub id: ImageId,
    pub reason: String,
}

/// Result of a delete call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: Vec<ImageId>,
    pub failures: Vec<DeleteFailure>,
}

/// Access to an image registry
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// List one page of repositories
    ///
    /// An empty `names` filter lists every repository.
    async fn list_repositories_page(
        &self,
        names: &[String],
        token: Option<&PageToken>,
    ) -> Result<Page<Repository>>;

    /// List one page of images in a repository
    async fn list_images_page(
        &self,
        repository: &str,
        token: Option<&PageToken>,
    ) -> Result<Page<ImageRecord>>;

    /// Delete images from a repository
    ///
    /// Unknown identifiers are reported as failures, not errors.
    async fn delete_images(&self, repository: &str, ids: &[ImageId]) -> Result<DeleteOutcome>;

    /// List all repositories matching `names` (empty = all)
    async fn list_repositories(&self, names: &[String]) -> Result<Vec<Repository>> {
        let mut repositories = Vec::new();
        let mut token: Option<PageToken> = None;

        loop {
            let page = self.list_repositories_page(names, token.as_ref()).await?;
            tracing::debug!(count = page.items.len(), "Fetched repository page");
            repositories.extend(page.items);

            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(repositories)
    }

    /// List every image in a repository
    async fn list_images(&self, repository: &str) -> Result<Vec<ImageRecord>> {
        let mut images = Vec::new();
        let mut token: Option<PageToken> = None;

        loop {
            let page = self.list_images_page(repository, token.as_ref()).await?;
            tracing::debug!(repository, count = page.items.len(), "Fetched image page");
            images.extend(page.items);

            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(images)
    }
}

/// Resolve an offset token into the index range of one page
///
/// Tokens are decimal offsets into a listing of `len` items.
pub(crate) fn page_range(
    len: usize,
    token: Option<&PageToken>,
    page_size: usize,
) -> Result<(Range<usize>, Option<PageToken>)> {
    let start = match token {
        Some(token) => token
            .0
            .parse::<usize>()
            .ok()
            .filter(|&offset| offset <= len)
            .ok_or_else(|| RegistryError::InvalidPageToken(token.0.clone()))?,
        None => 0,
    };

    let end = start.saturating_add(page_size.max(1)).min(len);
    let next = (end < len).then(|| PageToken(end.to_string()));
    Ok((start..end, next))
}

/// Cut one page out of a fully known listing
pub(crate) fn page_of<T: Clone>(
    items: &[T],
    token: Option<&PageToken>,
    page_size: usize,
) -> Result<Page<T>> {
    let (range, next) = page_range(items.len(), token, page_size)?;
    Ok(Page {
        items: items[range].to_vec(),
        next,
    })
}

/// Repository name filter with repeats dropped, in first-seen order
pub(crate) fn distinct_names(names: &[String]) -> Vec<&str> {
    let mut seen = AHashSet::with_capacity(names.len());
    names
        .iter()
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}
