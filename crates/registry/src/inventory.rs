//! Registry backed by a JSON inventory file
//!
//! The inventory is a snapshot of a registry:
//!
//! ```json
//! {
//!   "repositories": [
//!     {
//!       "name": "api",
//!       "uri": "registry.example.com/api",
//!       "images": [
//!         { "digest": "sha256:...", "tags": ["v1"], "pushed_at": "2024-01-03T14:30:00Z" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Deletions are applied in memory and written back to the file before the
//! delete call returns.

use crate::client::{DeleteFailure, DeleteOutcome, Page, PageToken, RegistryClient, Repository};
use crate::memory::MemoryRegistry;
use crate::{RegistryError, Result};
use async_trait::async_trait;
use policy::{ImageId, ImageRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Registry contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub repositories: Vec<InventoryRepository>,
}

/// One repository and its images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRepository {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

impl InventoryRepository {
    /// Name and URI without the images
    pub fn descriptor(&self) -> Repository {
        Repository {
            name: self.name.clone(),
            uri: self.uri.clone(),
        }
    }
}

impl Inventory {
    /// Parse an inventory document
    pub fn from_json(path: &Path, contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a repository by name
    pub fn repository(&self, name: &str) -> Result<&InventoryRepository> {
        self.repositories
            .iter()
            .find(|repository| repository.name == name)
            .ok_or_else(|| RegistryError::RepositoryNotFound(name.to_string()))
    }

    /// Remove images from a repository
    ///
    /// A digest removes the whole image. A tag is removed from the image it
    /// points at, and the image goes away with its last tag unless it is
    /// addressable by digest. Images the identifiers do not reach are left
    /// untouched.
    pub fn delete(&mut self, name: &str, ids: &[ImageId]) -> Result<DeleteOutcome> {
        let repository = self
            .repositories
            .iter_mut()
            .find(|repository| repository.name == name)
            .ok_or_else(|| RegistryError::RepositoryNotFound(name.to_string()))?;

        let mut outcome = DeleteOutcome::default();

        for id in ids {
            let found = match id {
                ImageId::Digest(digest) => {
                    let before = repository.images.len();
                    repository
                        .images
                        .retain(|image| image.digest.as_deref() != Some(digest.as_str()));
                    repository.images.len() != before
                }
                ImageId::Tag(tag) => untag(&mut repository.images, tag),
            };

            if found {
                outcome.deleted.push(id.clone());
            } else {
                outcome.failures.push(DeleteFailure {
                    id: id.clone(),
                    reason: "image not found".to_string(),
                });
            }
        }

        Ok(outcome)
    }
}

/// Remove `tag` from the images it points at
///
/// A tag only reaches a digest-addressed image when no digest-less image
/// carries it; digest-addressed images are deleted by digest. An image
/// stripped of its last tag without a digest is dropped.
fn untag(images: &mut Vec<ImageRecord>, tag: &str) -> bool {
    let carries = |image: &ImageRecord| image.tags.iter().any(|t| t == tag);
    let tag_only = images
        .iter()
        .any(|image| image.digest.is_none() && carries(image));

    let mut found = false;
    let mut emptied = Vec::new();
    for (index, image) in images.iter_mut().enumerate() {
        if !carries(&*image) || (tag_only && image.digest.is_some()) {
            continue;
        }
        image.tags.retain(|t| t != tag);
        found = true;
        if image.tags.is_empty() && image.digest.is_none() {
            emptied.push(index);
        }
    }

    for index in emptied.into_iter().rev() {
        images.remove(index);
    }
    found
}

/// Registry served from an inventory file
pub struct InventoryRegistry {
    path: PathBuf,
    inner: MemoryRegistry,
}

impl InventoryRegistry {
    /// Open an inventory file
    pub fn open(path: &Path, page_size: usize) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let inventory = Inventory::from_json(path, &contents)?;

        tracing::debug!(
            path = %path.display(),
            repositories = inventory.repositories.len(),
            "Loaded inventory"
        );

        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryRegistry::from_inventory(inventory, page_size),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state back to disk
    ///
    /// Writes a sibling temp file and renames it over the inventory.
    fn persist(&self) -> Result<()> {
        let encoded =
            serde_json::to_vec_pretty(&self.inner.snapshot()).map_err(RegistryError::Encode)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, encoded).map_err(|source| RegistryError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl RegistryClient for InventoryRegistry {
    async fn list_repositories_page(
        &self,
        names: &[String],
        token: Option<&PageToken>,
    ) -> Result<Page<Repository>> {
        self.inner.list_repositories_page(names, token).await
    }

    async fn list_images_page(
        &self,
        repository: &str,
        token: Option<&PageToken>,
    ) -> Result<Page<ImageRecord>> {
        self.inner.list_images_page(repository, token).await
    }

    async fn delete_images(&self, repository: &str, ids: &[ImageId]) -> Result<DeleteOutcome> {
        let outcome = self.inner.delete_images(repository, ids).await?;

        if !outcome.deleted.is_empty() {
            self.persist()?;
            tracing::info!(
                repository,
                deleted = outcome.deleted.len(),
                path = %self.path.display(),
                "Updated inventory"
            );
        }

        Ok(outcome)
    }
}
