//! Delete old images that no workload uses

use super::SelectionArgs;
use anyhow::{Context, Result};
use chrono::Utc;
use cli_lib::pipeline::{self, PruneSummary};
use cli_lib::util;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, selection: &SelectionArgs, yes: bool) -> Result<()> {
    // 1. Build the plan
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

    super::plan::print_plan(&plan, now);
    println!();

    if plan.is_empty() {
        println!("{}", "No images to delete - registry is already clean".dimmed());
        return Ok(());
    }

    // 2. Confirm
    if !yes && !confirm(plan.candidate_count())? {
        println!("{}", "Aborted".yellow());
        return Ok(());
    }

    // 3. Delete in batches
    let total_ids: usize = plan
        .repositories
        .iter()
        .flat_map(|repo| &repo.candidates)
        .map(|image| image.ids().len())
        .sum();

    let progress = ProgressBar::new(total_ids as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} Deleting [{bar:40}] {pos}/{len}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let summary = pipeline::execute_plan(
        &session.registry,
        &plan,
        session.config.registry.delete_batch_size,
        |handled| progress.inc(handled as u64),
    )
    .await;
    progress.finish_and_clear();

    // 4. Report
    print_summary(&summary);

    if !summary.is_clean() {
        anyhow::bail!("{} deletions failed", summary.failures.len());
    }

    Ok(())
}

fn confirm(count: usize) -> Result<bool> {
    print!("Delete {} images? [y/N] ", count);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_summary(summary: &PruneSummary) {
    if summary.is_clean() {
        println!("{}", "Prune Complete".green().bold());
    } else {
        println!("{}", "Prune Finished With Errors".red().bold());
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    println!("Images deleted:  {}", summary.images_deleted.to_string().yellow());
    if summary.bytes_freed > 0 {
        println!("Space freed:     {}", util::format_size(summary.bytes_freed).green());
    }
    if summary.images_skipped > 0 {
        println!(
            "Images skipped:  {} {}",
            summary.images_skipped.to_string().yellow(),
            "(no digest or tag)".dimmed()
        );
    }

    if !summary.failures.is_empty() {
        println!();
        println!("{}", "Failures:".red());
        for failure in &summary.failures {
            println!(
                "  {} {} {}",
                failure.repository.cyan(),
                failure.id,
                failure.reason.dimmed()
            );
        }
    }
}
