//! Configuration management command
//!
//! Shows the effective configuration and where it is read from.

use anyhow::{Context, Result};
use cli_lib::config;
use owo_colors::OwoColorize;
use std::path::Path;

/// Show the effective configuration
pub async fn run_show(explicit: Option<&Path>) -> Result<()> {
    let path = config::resolve_path(explicit);
    let config = config::load(explicit).context("Failed to load configuration")?;

    println!("{}", "Tagreaper Configuration".bold());
    match &path {
        Some(path) if path.exists() => {
            println!("{}: {}\n", "Location".dimmed(), path.display().dimmed())
        }
        Some(path) => println!(
            "{}: {} {}\n",
            "Location".dimmed(),
            path.display().dimmed(),
            "(not found, using defaults)".yellow()
        ),
        None => println!("{}\n", "No config directory, using defaults".yellow()),
    }

    let encoded = toml::to_string_pretty(&config).context("Failed to encode configuration")?;
    for line in encoded.lines() {
        if line.starts_with('[') {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  policy.keep_max: 0-100,000");
    println!("  policy.min_age_days: 0-3650 (0 = no age limit)");
    println!("  registry.page_size: 1-1000");
    println!("  registry.delete_batch_size: 1-100");

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(explicit: Option<&Path>, create: bool) -> Result<()> {
    let config_path =
        config::resolve_path(explicit).context("Could not determine config file path")?;

    if create && config::init_if_missing(&config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}
