//! In-memory registry

use crate::client::{
    distinct_names, page_of, page_range, DeleteOutcome, Page, PageToken, RegistryClient,
    Repository,
};
use crate::inventory::{Inventory, InventoryRepository};
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use policy::{ImageId, ImageRecord};

/// Default number of items per listing page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Registry held entirely in memory
///
/// Safe to share between tasks; all access goes through a lock.
pub struct MemoryRegistry {
    inventory: RwLock<Inventory>,
    page_size: usize,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::from_inventory(Inventory::default(), DEFAULT_PAGE_SIZE)
    }

    /// Serve an existing inventory
    pub fn from_inventory(inventory: Inventory, page_size: usize) -> Self {
        Self {
            inventory: RwLock::new(inventory),
            page_size: page_size.max(1),
        }
    }

    /// Set the listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Add a repository (builder form)
    pub fn with_repository(self, name: &str, images: Vec<ImageRecord>) -> Self {
        self.insert_repository(name, images);
        self
    }

    /// Add or replace a repository
    pub fn insert_repository(&self, name: &str, images: Vec<ImageRecord>) {
        let mut inventory = self.inventory.write();

        match inventory.repositories.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.images = images,
            None => inventory.repositories.push(InventoryRepository {
                name: name.to_string(),
                uri: None,
                images,
            }),
        }
    }

    /// Images currently stored in a repository
    pub fn images(&self, name: &str) -> Option<Vec<ImageRecord>> {
        self.inventory
            .read()
            .repository(name)
            .ok()
            .map(|repository| repository.images.clone())
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Inventory {
        self.inventory.read().clone()
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn list_repositories_page(
        &self,
        names: &[String],
        token: Option<&PageToken>,
    ) -> Result<Page<Repository>> {
        let inventory = self.inventory.read();

        if names.is_empty() {
            let (range, next) = page_range(inventory.repositories.len(), token, self.page_size)?;
            let items = inventory.repositories[range]
                .iter()
                .map(InventoryRepository::descriptor)
                .collect();
            return Ok(Page { items, next });
        }

        // Filtered listings page over the requested names
        let names = distinct_names(names);
        let (range, next) = page_range(names.len(), token, self.page_size)?;
        let items = names[range]
            .iter()
            .map(|name| inventory.repository(name).map(InventoryRepository::descriptor))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { items, next })
    }

    async fn list_images_page(
        &self,
        repository: &str,
        token: Option<&PageToken>,
    ) -> Result<Page<ImageRecord>> {
        let inventory = self.inventory.read();
        let repository = inventory.repository(repository)?;
        page_of(&repository.images, token, self.page_size)
    }

    async fn delete_images(&self, repository: &str, ids: &[ImageId]) -> Result<DeleteOutcome> {
        self.inventory.write().delete(repository, ids)
    }
}
