//! # xtask - Build Automation for msntp
//!
//! Build, test, lint and format the `msntp` crate and its demos following the
//! [xtask pattern](https://github.com/matklad/cargo-xtask). Run it from the
//! workspace root:
//!
//! ```text
//! cargo run -p xtask -- test
//! cargo run -p xtask -- clippy
//! ```
//!
//! `msntp` is verified with each entry of [`utils::FEATURE_SETS`], since the
//! `tokio`, `std-socket`, `log` and `utils` features gate whole modules.

/// Build automation commands
pub mod commands;

/// Cargo invocation, workspace discovery and output helpers
pub mod utils;

pub use anyhow::{Context, Result};
pub use colored::Colorize;
