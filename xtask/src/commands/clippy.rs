use crate::Result;
use crate::utils::{self, FEATURE_SETS, MSNTP_MANIFEST};

/// Runs Clippy with `clippy::all` and `clippy::pedantic` denied
///
/// `msntp` is linted once per feature set, the demos with all their features.
///
/// # Errors
///
/// Returns an error on the first target with lint findings.
pub fn run_clippy() -> Result<()> {
    utils::print_header("Running Clippy with strict linting on all code...");

    for (name, args) in FEATURE_SETS {
        let target = format!("msntp ({name})");
        utils::print_step("Clippy", &target);
        utils::run_cargo_clippy(MSNTP_MANIFEST, args)
            .inspect_err(|_| utils::print_step_error(&target))?;
        utils::print_step_success(&target);
    }

    for demo in utils::get_demos()? {
        utils::print_step("Clippy", &demo);
        utils::run_cargo_clippy(&utils::manifest_of(&demo), &["--all-features"])
            .inspect_err(|_| utils::print_step_error(&demo))?;
        utils::print_step_success(&demo);
    }

    utils::print_success("✓ All Clippy checks passed!");
    Ok(())
}
