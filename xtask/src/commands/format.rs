use crate::Result;
use crate::utils;

pub fn check_formatting() -> Result<()> {
    utils::print_header("Checking code formatting...");

    utils::run_cargo_fmt(true).inspect_err(|_| utils::print_error("✗ Formatting issues found"))?;

    utils::print_success("✓ All formatting checks passed!");
    Ok(())
}

pub fn fix_formatting() -> Result<()> {
    utils::print_header("Fixing code formatting...");

    utils::run_cargo_fmt(false)?;

    utils::print_success("✓ All formatting issues fixed!");
    Ok(())
}
