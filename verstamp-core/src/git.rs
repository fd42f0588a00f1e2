//! Git descriptor lookup
//!
//! Uses git CLI directly (no libgit2) for portability.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Execute a git command in a specific directory and return the trimmed stdout
///
/// A non-zero exit becomes [`Error::Git`] carrying git's own exit code and
/// captured stderr.
fn git_at(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .map_err(Error::io("failed to invoke git in", repo_path))?;

    if !output.status.success() {
        return Err(Error::Git {
            args: args.iter().map(|a| a.to_string()).collect(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Describe HEAD relative to the nearest tag, e.g. `v1.2.0-5-gabcdef`
///
/// Only annotated tags are considered unless `include_lightweight` is set
/// (`git describe --tags`).
pub fn describe(repo_path: &Path, include_lightweight: bool) -> Result<String> {
    let args: &[&str] = if include_lightweight {
        &["describe", "--tags"]
    } else {
        &["describe"]
    };

    let descriptor = git_at(repo_path, args)?;
    debug!("git {} -> {}", args.join(" "), descriptor);
    Ok(descriptor)
}
