//! In-use tag collection
//!
//! Tags come from the `[in_use]` config section and from tag files. A tag
//! file holds one entry per line: either a bare tag (`v1.4.2`) or a full
//! image reference (`registry.example.com/api:v1.4.2`), from which the tag
//! is taken. Blank lines and `#` comments are skipped, as are digest
//! references, which name no tag.

use crate::config::InUseConfig;
use ahash::AHashSet;
use anyhow::{Context, Result};
use std::path::Path;

/// Collect every in-use tag named by the configuration
pub fn collect(config: &InUseConfig) -> Result<AHashSet<String>> {
    let mut tags: AHashSet<String> = config
        .tags
        .iter()
        .filter_map(|entry| tag_of(entry))
        .map(str::to_owned)
        .collect();

    for path in &config.files {
        let before = tags.len();
        tags.extend(read_tag_file(path)?);
        tracing::debug!(
            path = %path.display(),
            added = tags.len() - before,
            "Read in-use tag file"
        );
    }

    tracing::info!(count = tags.len(), "Collected in-use tags");
    Ok(tags)
}

/// Read the tags listed in one file
pub fn read_tag_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read in-use tag file {}", path.display()))?;

    Ok(parse_tag_lines(&contents).map(str::to_owned).collect())
}

/// Tags named by the lines of a tag file
pub fn parse_tag_lines(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter_map(tag_of)
}

/// Tag named by a bare tag or an image reference
fn tag_of(entry: &str) -> Option<&str> {
    let entry = entry.trim();
    if entry.is_empty() || entry.contains('@') {
        return None;
    }

    // A ':' after the last '/' separates the tag; one before it belongs to
    // a registry host:port.
    let name_start = entry.rfind('/').map_or(0, |i| i + 1);
    match entry[name_start..].rfind(':') {
        Some(i) => {
            let tag = &entry[name_start + i + 1..];
            (!tag.is_empty()).then_some(tag)
        }
        None if name_start == 0 => Some(entry),
        // Reference without a tag (`registry/api`)
        None => None,
    }
}
