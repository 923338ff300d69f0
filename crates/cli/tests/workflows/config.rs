//! `reaper config` workflows and config-driven runs

use crate::common::{sample_inventory, TestRegistry};
use anyhow::Result;

#[test]
fn test_config_example() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;

    let result = crate::reaper!(registry.path(), "config", "example").assert_success()?;

    assert!(result.contains_stdout("[policy]"));
    assert!(result.contains_stdout("keep_max = 10"));
    Ok(())
}

#[test]
fn test_config_path_create() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let config_path = registry.path().join("conf").join("config.toml");
    let config_arg = config_path.display().to_string();

    let result = crate::reaper!(
        registry.path(),
        "config",
        "path",
        "--create",
        "--config",
        config_arg.as_str()
    )
    .assert_success()?;

    assert!(result.contains_stdout("Created config file"));
    assert!(config_path.exists());
    Ok(())
}

#[test]
fn test_config_show_defaults() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;

    let result = crate::reaper!(registry.path(), "config", "show").assert_success()?;

    assert!(result.contains_stdout("not found, using defaults"));
    assert!(result.contains_stdout("keep_max = 10"));
    Ok(())
}

#[test]
fn test_config_file_drives_plan() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let config = format!(
        "[policy]\nkeep_max = 4\n\n[registry]\ninventory = {:?}\nrepositories = [\"api\"]\n\n[in_use]\ntags = [\"v0\"]\n",
        registry.inventory_arg()
    );
    let config_arg = registry.write_file("config.toml", &config)?;

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--json",
        "--config",
        config_arg.as_str()
    )
    .assert_success()?;
    let plan = result.json()?;

    let repositories = plan["repositories"].as_array().map(Vec::len);
    assert_eq!(repositories, Some(1));
    assert_eq!(plan["repositories"][0]["candidates"][0]["tags"][0], "v1");
    assert_eq!(plan["repositories"][0]["candidates"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let config_arg = registry.write_file("config.toml", "[registry]\ndelete_batch_size = 0\n")?;

    let result = crate::reaper!(
        registry.path(),
        "plan",
        "--config",
        config_arg.as_str()
    )
    .assert_failure()?;

    assert!(result.contains_stderr("out of range"));
    Ok(())
}
