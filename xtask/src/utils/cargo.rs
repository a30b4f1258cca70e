use crate::{Context, Result};
use std::process::Command;

/// Manifest of the library crate
pub const MSNTP_MANIFEST: &str = "msntp/Cargo.toml";

/// Feature combinations `msntp` is built, tested and linted with
pub const FEATURE_SETS: &[(&str, &[&str])] = &[
    ("default features", &[]),
    ("no default features", &["--no-default-features"]),
    (
        "std-socket only",
        &["--no-default-features", "--features", "std-socket"],
    ),
    ("all features", &["--all-features"]),
];

const STRICT_LINTS: &[&str] = &["--", "-D", "clippy::all", "-D", "clippy::pedantic"];

/// Run `cargo <subcommand> --manifest-path <manifest_path> <args>`
///
/// # Errors
///
/// Returns an error if cargo cannot be started or exits unsuccessfully.
pub fn run_cargo(subcommand: &str, manifest_path: &str, args: &[&str]) -> Result<()> {
    let status = Command::new("cargo")
        .args([subcommand, "--manifest-path", manifest_path])
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute cargo {subcommand} for {manifest_path}"))?;

    if !status.success() {
        anyhow::bail!("cargo {subcommand} failed for {manifest_path}");
    }

    Ok(())
}

/// Run clippy with `clippy::all` and `clippy::pedantic` denied
///
/// # Errors
///
/// Returns an error if clippy cannot be started or reports any lint.
pub fn run_cargo_clippy(manifest_path: &str, args: &[&str]) -> Result<()> {
    let args: Vec<&str> = args.iter().chain(STRICT_LINTS).copied().collect();

    run_cargo("clippy", manifest_path, &args)
}

/// Run `cargo fmt` on the whole workspace, only checking if `check` is set
///
/// # Errors
///
/// Returns an error if rustfmt cannot be started or finds unformatted code.
pub fn run_cargo_fmt(check: bool) -> Result<()> {
    let mut command = Command::new("cargo");
    command.args(["fmt", "--all"]);

    if check {
        command.arg("--check");
    }

    let status = command.status().context("Failed to execute cargo fmt")?;

    if !status.success() {
        anyhow::bail!("cargo fmt reported unformatted code");
    }

    Ok(())
}
