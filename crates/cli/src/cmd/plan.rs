//! Show deletion candidates without deleting

use super::SelectionArgs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cli_lib::pipeline::{self, Plan};
use cli_lib::util;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, selection: &SelectionArgs, json: bool) -> Result<()> {
    let session = super::open_session(config_path, selection)?;
    let now = Utc::now();

    let plan = pipeline::build_plan(
        &session.registry,
        &session.config.registry.repositories,
        &session.config.retention_policy(),
        &session.tags_in_use,
        now,
    )
    .await?;

    if json {
        let encoded = serde_json::to_string_pretty(&plan).context("Failed to encode plan")?;
        println!("{}", encoded);
    } else {
        print_plan(&plan, now);
    }

    Ok(())
}

/// Print the plan grouped by repository
pub fn print_plan(plan: &Plan, now: DateTime<Utc>) {
    println!("{}", "Cleanup Plan".bold());
    println!(
        "{}: {} per repository",
        "Keeping".dimmed(),
        format!("{} images", plan.keep_max).cyan()
    );
    println!();

    for repo in &plan.repositories {
        println!(
            "{} {}",
            repo.repository.name.cyan().bold(),
            format!(
                "({} images, {} in use)",
                repo.total_images, repo.protected_images
            )
            .dimmed()
        );

        if repo.candidates.is_empty() {
            println!("  {}", "nothing to delete".dimmed());
        }

        for image in &repo.candidates {
            let tags = if image.is_untagged() {
                "<untagged>".to_string()
            } else {
                image.tags.join(", ")
            };
            let size = image.size_bytes.map(util::format_size).unwrap_or_default();

            println!(
                "  {} {} {} {}",
                util::image_label(image).yellow(),
                tags,
                util::format_age(image.pushed_at, now).dimmed(),
                size.dimmed()
            );
        }
        println!();
    }

    let reclaimable = plan.reclaimable_bytes();
    println!(
        "{} images to delete across {} repositories{}",
        plan.candidate_count().to_string().yellow(),
        plan.repositories.len(),
        if reclaimable > 0 {
            format!(" ({} reclaimable)", util::format_size(reclaimable))
        } else {
            String::new()
        }
    );
}
