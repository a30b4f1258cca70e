use crate::Result;
use std::fs;
use std::path::Path;

/// Returns the directories of all workspace members, sorted
///
/// Reads `workspace.members` from the root `Cargo.toml` and expands glob patterns
/// such as `demos/*`.
///
/// # Errors
///
/// Returns an error if the root manifest cannot be read or parsed, or if a member
/// pattern is not a valid glob.
pub fn get_workspace_members() -> Result<Vec<String>> {
    let content = fs::read_to_string(Path::new("Cargo.toml"))?;
    let manifest: toml::Value = toml::from_str(&content)?;

    let members = manifest
        .get("workspace")
        .and_then(|ws| ws.get("members"))
        .and_then(|m| m.as_array())
        .ok_or_else(|| anyhow::anyhow!("Failed to parse workspace members from Cargo.toml"))?;

    let mut crates = Vec::new();
    for pattern in members.iter().filter_map(toml::Value::as_str) {
        for entry in glob::glob(pattern)?.flatten() {
            if entry.join("Cargo.toml").exists() {
                crates.push(entry.to_string_lossy().into_owned());
            }
        }
    }

    crates.sort();
    Ok(crates)
}

/// Returns the directories of all demo binaries, sorted
///
/// # Errors
///
/// Returns an error if workspace members cannot be discovered.
pub fn get_demos() -> Result<Vec<String>> {
    Ok(get_workspace_members()?
        .into_iter()
        .filter(|member| member.starts_with("demos"))
        .collect())
}

/// Manifest path of a workspace member directory
#[must_use]
pub fn manifest_of(member: &str) -> String {
    format!("{member}/Cargo.toml")
}
