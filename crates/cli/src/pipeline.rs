//! Cleanup pipeline
//!
//! Runs the retention policy over every selected repository to build a
//! plan, then optionally executes the plan against the registry. Listing
//! failures abort the run; deletion failures are collected per image and
//! the remaining batches still go out.

use ahash::AHashSet;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use policy::{ImageId, ImageRecord, RetentionPolicy};
use registry::{RegistryClient, Repository};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Deletion candidates for one repository
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryPlan {
    pub repository: Repository,
    pub total_images: usize,
    /// Images carrying at least one in-use tag
    pub protected_images: usize,
    /// Oldest first
    pub candidates: Vec<ImageRecord>,
}

impl RepositoryPlan {
    pub fn reclaimable_bytes(&self) -> u64 {
        self.candidates.iter().filter_map(|image| image.size_bytes).sum()
    }
}

/// Deletion candidates across repositories
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub generated_at: DateTime<Utc>,
    pub keep_max: usize,
    pub repositories: Vec<RepositoryPlan>,
}

impl Plan {
    /// Number of images selected for deletion
    pub fn candidate_count(&self) -> usize {
        self.repositories.iter().map(|r| r.candidates.len()).sum()
    }

    /// Size of all candidates that report one
    pub fn reclaimable_bytes(&self) -> u64 {
        self.repositories.iter().map(RepositoryPlan::reclaimable_bytes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.candidate_count() == 0
    }
}

/// Evaluate the retention policy over the selected repositories
///
/// `names` filters repositories (empty = all).
pub async fn build_plan<C>(
    client: &C,
    names: &[String],
    policy: &RetentionPolicy,
    tags_in_use: &AHashSet<String>,
    now: DateTime<Utc>,
) -> Result<Plan>
where
    C: RegistryClient + ?Sized,
{
    let repositories = client
        .list_repositories(names)
        .await
        .context("Failed to list repositories")?;

    info!(count = repositories.len(), "Evaluating repositories");

    let mut plans = Vec::with_capacity(repositories.len());
    for repository in repositories {
        let images = client
            .list_images(&repository.name)
            .await
            .with_context(|| format!("Failed to list images in {}", repository.name))?;

        let candidates: Vec<ImageRecord> = policy
            .evaluate_in(&images, tags_in_use, now)
            .into_iter()
            .cloned()
            .collect();
        let protected_images = images
            .iter()
            .filter(|image| image.tags.iter().any(|tag| tags_in_use.contains(tag)))
            .count();

        debug!(
            repository = %repository.name,
            images = images.len(),
            protected = protected_images,
            candidates = candidates.len(),
            "Evaluated repository"
        );

        plans.push(RepositoryPlan {
            repository,
            total_images: images.len(),
            protected_images,
            candidates,
        });
    }

    Ok(Plan {
        generated_at: now,
        keep_max: policy.keep_max,
        repositories: plans,
    })
}

/// A deletion that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneFailure {
    pub repository: String,
    pub id: ImageId,
    pub reason: String,
}

/// Outcome of executing a plan
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneSummary {
    /// Images whose identifiers were all deleted
    pub images_deleted: usize,
    pub bytes_freed: u64,
    /// Candidates with neither digest nor tag
    pub images_skipped: usize,
    pub failures: Vec<PruneFailure>,
}

impl PruneSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete every candidate of `plan`, `batch_size` identifiers per call
///
/// `on_progress` receives the number of identifiers handled after each
/// delete call.
pub async fn execute_plan<C, F>(
    client: &C,
    plan: &Plan,
    batch_size: usize,
    mut on_progress: F,
) -> PruneSummary
where
    C: RegistryClient + ?Sized,
    F: FnMut(usize),
{
    let mut summary = PruneSummary::default();

    for repo_plan in &plan.repositories {
        let name = repo_plan.repository.name.as_str();
        if repo_plan.candidates.is_empty() {
            continue;
        }

        let mut ids: Vec<ImageId> = Vec::new();
        for image in &repo_plan.candidates {
            let image_ids = image.ids();
            if image_ids.is_empty() {
                warn!(repository = %name, pushed_at = %image.pushed_at, "Skipping image without digest or tag");
                summary.images_skipped += 1;
            }
            ids.extend(image_ids);
        }

        let mut deleted: AHashSet<ImageId> = AHashSet::with_capacity(ids.len());
        for batch in ids.chunks(batch_size.max(1)) {
            match client.delete_images(name, batch).await {
                Ok(outcome) => {
                    deleted.extend(outcome.deleted);
                    for failure in outcome.failures {
                        warn!(repository = %name, id = %failure.id, reason = %failure.reason, "Delete failed");
                        summary.failures.push(PruneFailure {
                            repository: name.to_string(),
                            id: failure.id,
                            reason: failure.reason,
                        });
                    }
                }
                Err(e) => {
                    warn!(repository = %name, error = %e, batch = batch.len(), "Delete call failed");
                    summary.failures.extend(batch.iter().map(|id| PruneFailure {
                        repository: name.to_string(),
                        id: id.clone(),
                        reason: e.to_string(),
                    }));
                }
            }
            on_progress(batch.len());
        }

        for image in &repo_plan.candidates {
            let image_ids = image.ids();
            if !image_ids.is_empty() && image_ids.iter().all(|id| deleted.contains(id)) {
                summary.images_deleted += 1;
                summary.bytes_freed += image.size_bytes.unwrap_or(0);
            }
        }

        info!(repository = %name, deleted = deleted.len(), "Pruned repository");
    }

    summary
}
