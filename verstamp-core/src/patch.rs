//! File patching
//!
//! Applies [`rewrite_content`](crate::rewrite::rewrite_content) to every patch
//! target under a root, then to the installer script at the root.
//!
//! Global invariants enforced:
//! - Only files returned by the walk (plus the installer) are opened for writing
//! - Each file is replaced atomically: temp file in the same directory, sync, rename
//! - A file whose content would not change is never written
//! - The run is not transactional: files patched before an error stay patched

use crate::error::{Error, Result};
use crate::rewrite::rewrite_content;
use crate::version::VersionTuple;
use crate::walk::{collect_targets, TargetMatcher};
use std::fs::{self, OpenOptions, Permissions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Installer script expected at the root of every tree
pub const DEFAULT_INSTALLER: &str = "SXAscomInstaller.iss";

/// Whether patched content is written back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchMode {
    #[default]
    Write,
    /// Compute replacements but leave every file untouched
    DryRun,
}

/// Outcome of patching one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedFile {
    pub path: PathBuf,
    /// Number of version tokens found
    pub replacements: usize,
    /// Whether the content differs from what was on disk
    pub changed: bool,
}

/// Outcome of patching a tree, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub files: Vec<PatchedFile>,
}

impl PatchReport {
    pub fn changed_count(&self) -> usize {
        self.files.iter().filter(|f| f.changed).count()
    }
}

/// Options for [`patch_tree`]
#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub matcher: TargetMatcher,
    /// File name of the installer script, relative to the root
    pub installer: String,
    pub mode: PatchMode,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            matcher: TargetMatcher::new(),
            installer: DEFAULT_INSTALLER.to_string(),
            mode: PatchMode::Write,
        }
    }
}

/// Patch every target under `root`, then the installer script
///
/// `on_file` is called with each path right before it is patched.
///
/// # Errors
///
/// - [`Error::Io`] if the walk fails or a target cannot be opened for read+write
/// - [`Error::MissingFile`] if the installer script does not exist at the root
pub fn patch_tree(
    root: &Path,
    version: &VersionTuple,
    options: &PatchOptions,
    mut on_file: impl FnMut(&Path),
) -> Result<PatchReport> {
    let installer = root.join(&options.installer);

    let mut targets = collect_targets(root, &options.matcher)?;
    // The installer is patched exactly once, after the walk
    targets.retain(|path| path != &installer);

    let mut report = PatchReport::default();
    for path in targets {
        on_file(&path);
        report.files.push(patch_file(&path, version, options.mode)?);
    }

    if !installer.is_file() {
        return Err(Error::MissingFile(installer));
    }
    on_file(&installer);
    report
        .files
        .push(patch_file(&installer, version, options.mode)?);

    Ok(report)
}

/// Patch a single file in place
///
/// The file must be openable for reading and writing even when nothing in it
/// would change.
pub fn patch_file(path: &Path, version: &VersionTuple, mode: PatchMode) -> Result<PatchedFile> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(Error::io("failed to open", path))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(Error::io("failed to read", path))?;
    let permissions = file
        .metadata()
        .map_err(Error::io("failed to read metadata", path))?
        .permissions();
    drop(file);

    let rewritten = rewrite_content(&content, version);
    let changed = rewritten.bytes != content;

    if !changed {
        debug!(
            "{} unchanged ({} tokens)",
            path.display(),
            rewritten.replacements
        );
    } else if mode == PatchMode::Write {
        atomic_replace(path, &rewritten.bytes, permissions)?;
    }

    Ok(PatchedFile {
        path: path.to_path_buf(),
        replacements: rewritten.replacements,
        changed,
    })
}

/// Replace `path` with `contents` via a temp file and rename
///
/// Symlinks are resolved first so the rename replaces the file they point to,
/// not the link. The temp file lives next to that file so the rename stays on
/// one filesystem. On failure it is removed and `path` is left as it was.
fn atomic_replace(path: &Path, contents: &[u8], permissions: Permissions) -> Result<()> {
    let target = fs::canonicalize(path).map_err(Error::io("failed to resolve", path))?;
    let temp_path = temp_path_for(&target);

    let result = write_temp(&temp_path, contents, permissions).and_then(|()| {
        fs::rename(&temp_path, &target).map_err(Error::io("failed to replace", &target))
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn write_temp(temp_path: &Path, contents: &[u8], permissions: Permissions) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .map_err(Error::io("failed to create temp file", temp_path))?;

    file.write_all(contents)
        .map_err(Error::io("failed to write temp file", temp_path))?;
    file.set_permissions(permissions)
        .map_err(Error::io("failed to set permissions on", temp_path))?;
    file.sync_all()
        .map_err(Error::io("failed to sync temp file", temp_path))?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // pid alone repeats across container restarts; a stale temp must not block
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), nanos))
}
