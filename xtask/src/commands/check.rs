use crate::Result;
use crate::utils;

pub fn check_all() -> Result<()> {
    utils::print_header("Checking all workspace members...");

    for member in utils::get_workspace_members()? {
        utils::print_step("Checking", &member);
        utils::run_cargo("check", &utils::manifest_of(&member), &["--all-targets"])
            .inspect_err(|_| utils::print_step_error(&member))?;
        utils::print_step_success(&member);
    }

    utils::print_success("✓ All checks passed!");
    Ok(())
}
