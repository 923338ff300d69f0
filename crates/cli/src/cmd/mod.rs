//! CLI command implementations

pub mod config;
pub mod plan;
pub mod prune;

use ahash::AHashSet;
use anyhow::{Context, Result};
use clap::Args;
use cli_lib::config::{Config, Overrides};
use cli_lib::in_use;
use registry::InventoryRegistry;
use std::path::{Path, PathBuf};

/// Policy and selection flags shared by `plan` and `prune`
#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Images to keep per repository (overrides policy.keep_max)
    #[arg(long, value_name = "N")]
    keep: Option<usize>,

    /// Never delete images pushed within this many days
    #[arg(long, value_name = "DAYS")]
    min_age_days: Option<u32>,

    /// Registry inventory file (overrides registry.inventory)
    #[arg(long, value_name = "PATH")]
    inventory: Option<PathBuf>,

    /// Repository to clean, repeatable (default: configured list, else all)
    #[arg(long = "repo", value_name = "NAME")]
    repositories: Vec<String>,

    /// Tag in use by a workload, repeatable
    #[arg(long = "in-use", value_name = "TAG")]
    in_use_tags: Vec<String>,

    /// File listing in-use tags, repeatable
    #[arg(long = "in-use-file", value_name = "PATH")]
    in_use_files: Vec<PathBuf>,
}

impl SelectionArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            keep_max: self.keep,
            min_age_days: self.min_age_days,
            inventory: self.inventory.clone(),
            repositories: self.repositories.clone(),
            in_use_tags: self.in_use_tags.clone(),
            in_use_files: self.in_use_files.clone(),
        }
    }
}

/// Everything a plan or prune run works with
pub struct Session {
    pub config: Config,
    pub registry: InventoryRegistry,
    pub tags_in_use: AHashSet<String>,
}

/// Load config, apply flags, collect in-use tags and open the registry
pub fn open_session(config_path: Option<&Path>, selection: &SelectionArgs) -> Result<Session> {
    let mut config =
        cli_lib::config::load(config_path).context("Failed to load configuration")?;
    config.apply(&selection.overrides());
    config.validate().context("Invalid configuration")?;

    let tags_in_use = in_use::collect(&config.in_use)?;

    let inventory = &config.registry.inventory;
    let registry = InventoryRegistry::open(inventory, config.registry.page_size)
        .with_context(|| format!("Failed to open registry inventory {}", inventory.display()))?;

    tracing::info!(
        inventory = %inventory.display(),
        keep_max = config.policy.keep_max,
        in_use = tags_in_use.len(),
        "Session ready"
    );

    Ok(Session {
        config,
        registry,
        tags_in_use,
    })
}
