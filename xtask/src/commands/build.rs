use crate::Result;
use crate::utils::{self, FEATURE_SETS, MSNTP_MANIFEST};

/// Builds `msntp` with every feature set in [`FEATURE_SETS`]
///
/// # Errors
///
/// Returns an error on the first feature set that fails to build.
pub fn build_crate() -> Result<()> {
    utils::print_header("Building msntp...");

    for (name, args) in FEATURE_SETS {
        utils::print_step("Building", name);
        utils::run_cargo("build", MSNTP_MANIFEST, args).inspect_err(|_| {
            utils::print_step_error(name);
        })?;
        utils::print_step_success(name);
    }

    utils::print_success("✓ msntp built with all feature sets!");
    Ok(())
}

/// Builds every demo under `demos/`
///
/// # Errors
///
/// Returns an error if demos cannot be discovered or one of them fails to build.
pub fn build_demos() -> Result<()> {
    utils::print_header("Building demos...");

    for demo in utils::get_demos()? {
        utils::print_step("Building", &demo);
        utils::run_cargo("build", &utils::manifest_of(&demo), &["--all-features"])
            .inspect_err(|_| utils::print_step_error(&demo))?;
        utils::print_step_success(&demo);
    }

    utils::print_success("✓ All demos built successfully!");
    Ok(())
}
