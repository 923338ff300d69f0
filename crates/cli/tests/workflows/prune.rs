//! `reaper prune` workflows

use crate::common::{sample_inventory, TestRegistry};
use anyhow::Result;

#[test]
fn test_prune_deletes_the_plan() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();
    let tags_file = registry.write_file(
        "deployed.txt",
        "# running in production\nregistry.example.com/api:v0\n",
    )?;

    let result = crate::reaper!(
        registry.path(),
        "prune",
        "-y",
        "--keep",
        "2",
        "--in-use-file",
        tags_file.as_str(),
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;

    assert!(result.contains_stdout("Prune Complete"));
    assert_eq!(registry.remaining_tags("api")?, ["v0", "v4"]);
    assert_eq!(registry.remaining_tags("web")?, ["w1", "w2"]);
    Ok(())
}

#[test]
fn test_prune_aborts_without_confirmation() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();
    let before = registry.read_inventory()?;

    let result = crate::reaper!(
        registry.path(),
        "prune",
        "--keep",
        "0",
        "--inventory",
        inventory.as_str()
    )
    .stdin("n\n")
    .assert_success()?;

    assert!(result.contains_stdout("Aborted"));
    assert_eq!(registry.read_inventory()?, before);
    Ok(())
}

#[test]
fn test_prune_after_confirmation() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    crate::reaper!(
        registry.path(),
        "prune",
        "--keep",
        "4",
        "--inventory",
        inventory.as_str()
    )
    .stdin("y\n")
    .assert_success()?;

    assert_eq!(registry.remaining_tags("api")?, ["v1", "v2", "v3", "v4"]);
    assert_eq!(registry.remaining_tags("web")?, ["w0", "w1", "w2"]);
    Ok(())
}

#[test]
fn test_prune_twice_is_a_noop() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    for _ in 0..2 {
        crate::reaper!(
            registry.path(),
            "prune",
            "-y",
            "--keep",
            "1",
            "--inventory",
            inventory.as_str()
        )
        .assert_success()?;
    }

    let result = crate::reaper!(
        registry.path(),
        "prune",
        "-y",
        "--keep",
        "1",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;

    assert!(result.contains_stdout("already clean"));
    assert_eq!(registry.remaining_tags("api")?, ["v4"]);
    assert_eq!(registry.remaining_tags("web")?, ["w2"]);
    Ok(())
}

#[test]
fn test_prune_keeps_everything_in_use() -> Result<()> {
    let registry = TestRegistry::with_inventory(&sample_inventory())?;
    let inventory = registry.inventory_arg();

    let result = crate::reaper!(
        registry.path(),
        "prune",
        "-y",
        "--keep",
        "0",
        "--repo",
        "web",
        "--in-use",
        "w0",
        "--in-use",
        "w1",
        "--in-use",
        "w2",
        "--inventory",
        inventory.as_str()
    )
    .assert_success()?;

    assert!(result.contains_stdout("already clean"));
    assert_eq!(registry.remaining_tags("web")?, ["w0", "w1", "w2"]);
    Ok(())
}
