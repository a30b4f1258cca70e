use crate::{Context, Result};
use crate::utils;
use std::process::Command;

/// Removes the shared workspace `target` directory
///
/// # Errors
///
/// Returns an error if `cargo clean` cannot be executed or fails.
pub fn clean_all() -> Result<()> {
    utils::print_header("Cleaning all build artifacts...");

    let status = Command::new("cargo")
        .arg("clean")
        .status()
        .context("Failed to execute cargo clean")?;

    if !status.success() {
        anyhow::bail!("cargo clean failed");
    }

    utils::print_success("✓ All build artifacts cleaned!");
    Ok(())
}
