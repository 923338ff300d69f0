//! `reaper plan` workflows

use crate::common::{sample_inventory, TestRegistry};
use anyhow::Result;
use serde_json::Value;

fn candidate_tags(plan: &Value, repo_index: usize) -> Vec<String> {
    plan["repositories"][repo_index]["candidates"]
        .as_array()
        .map(|candidates| {
            candidates
                .iter()
                .filter_map(|image| image["tags"][0].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_plan_lists_oldest_beyond_keep() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--json",
        "--keep",
        "2",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;
    let plan = result.json()?;

    assert_eq!(plan["keep_max"], 2);
    assert_eq!(plan["repositories"][0]["repository"]["name"], "api");
    assert_eq!(candidate_tags(&plan, 0), ["v0", "v1", "v2"]);
    assert_eq!(candidate_tags(&plan, 1), ["w0"]);
    Ok(())
}

#[test]
fn test_plan_in_use_images_fill_kept_slots() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--json",
        "--keep",
        "2",
        "--in-use",
        "v0",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;
    let plan = result.json()?;

    assert_eq!(plan["repositories"][0]["protected_images"], 1);
    assert_eq!(candidate_tags(&plan, 0), ["v1", "v2", "v3"]);
    Ok(())
}

#[test]
fn test_plan_leaves_inventory_untouched() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();
    let before = registry.read_inventory()?;

    crate::reaper!(
        registry.path(),
        "plan",
        "--keep",
        "0",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;

    assert_eq!(registry.read_inventory()?, before);
    Ok(())
}

#[test]
fn test_plan_repository_filter() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--json",
        "--keep",
        "0",
        "--repo",
        "web",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;
    let plan = result.json()?;

    let repositories = plan["repositories"].as_array().map(Vec::len);
    assert_eq!(repositories, Some(1));
    assert_eq!(candidate_tags(&plan, 0), ["w0", "w1", "w2"]);
    Ok(())
}

#[test]
fn test_plan_unknown_repository_fails() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--repo",
        "db",
        "--inventory",
        inventory.as_str()
    )
    .assert_failure()?;

    assert!(result.contains_stderr("repository not found: db"));
    Ok(())
}

#[test]
fn test_plan_missing_inventory_fails() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;

    let result = crate::reaper!(registry.path(), "plan", "--inventory", "missing.json")
        .assert_failure()?;

    assert!(result.contains_stderr("Failed to open registry inventory"));
    Ok(())
}

#[test]
fn test_plan_text_output() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--keep",
        "3",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;

    assert!(result.contains_stdout("Cleanup Plan"));
    assert!(result.contains_stdout("api"));
    assert!(result.contains_stdout("v1"));
    assert!(result.contains_stdout("reclaimable"));
    Ok(())
}
