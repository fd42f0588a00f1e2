//! verstamp core library - stamp git-tag derived versions into project files

#![deny(warnings)]

// Global invariants enforced in this crate:
// - No global mutable state, no threads, no async
// - The walk root is always an explicit parameter, never the process cwd
// - The clock is an input; nothing here reads it
// - Files that are not patch targets are never opened for writing

pub mod config;
pub mod error;
pub mod git;
pub mod patch;
pub mod rewrite;
pub mod version;
pub mod walk;

pub use config::ResolvedConfig;
pub use error::{Error, Result};
pub use patch::{PatchMode, PatchReport, PatchedFile};
pub use version::{ExplicitVersion, VersionTuple};

use chrono::NaiveDateTime;
use std::path::Path;

/// Inputs for a single bump run
#[derive(Debug, Clone)]
pub struct BumpOptions {
    /// Major/minor override; the tag's values are used when `None`
    pub explicit: Option<ExplicitVersion>,
    pub now: NaiveDateTime,
    pub mode: PatchMode,
}

/// Result of a bump run
#[derive(Debug, Clone)]
pub struct Bump {
    pub version: VersionTuple,
    pub report: PatchReport,
}

/// Describe the repository at `root`, resolve the version and patch the tree
///
/// Git is queried before any file is touched, so a failing `git describe`
/// leaves the tree unmodified. `on_file` is called before each file is patched.
pub fn bump_with_config(
    root: &Path,
    options: BumpOptions,
    config: &ResolvedConfig,
    on_file: impl FnMut(&Path),
) -> Result<Bump> {
    let descriptor = git::describe(root, config.describe_tags)?;
    let version = version::resolve(
        &descriptor,
        options.explicit,
        options.now,
        config.tag_prefix,
    )?;
    tracing::debug!("resolved {} from {:?}", version, descriptor);

    let patch_options = config.patch_options(options.mode);
    let report = patch::patch_tree(root, &version, &patch_options, on_file)?;

    Ok(Bump { version, report })
}

/// Suggested follow-up commands after a bump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCommands {
    pub commit: String,
    pub tag: String,
}

/// Build the `git commit` / `git tag` commands for a version
pub fn release_commands(version: &VersionTuple, tag_prefix: char) -> ReleaseCommands {
    ReleaseCommands {
        commit: format!("git commit -a -m \"changes for version {}\"", version),
        tag: format!(
            "git tag -a -m \"tagging version {v}\" {p}{v}",
            v = version,
            p = tag_prefix
        ),
    }
}
