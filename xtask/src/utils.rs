//! Helpers shared by the commands
//!
//! - [`cargo`] - running cargo and the feature sets `msntp` is verified with
//! - [`crates`] - workspace member and demo discovery
//! - [`output`] - colored terminal output

pub mod cargo;
pub mod crates;
pub mod output;

pub use cargo::*;
pub use crates::*;
pub use output::*;
