//! Patch target discovery
//!
//! Global invariants enforced:
//! - `.git` directories are never descended into (exact, case-sensitive name)
//! - Symlinks are neither followed nor returned
//! - Deterministic ordering: results are sorted by path

use crate::error::{Error, Result};
use globset::GlobSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name that is never walked into
pub const VCS_DIR: &str = ".git";

/// File name suffix of per-project .NET version info files (compared lowercase)
pub const ASSEMBLY_INFO_SUFFIX: &str = "assemblyinfo.cs";

/// Decides which files are patch targets
#[derive(Debug, Clone, Default)]
pub struct TargetMatcher {
    /// Extra case-insensitive globs, matched against the root-relative path
    extra: Option<GlobSet>,
}

impl TargetMatcher {
    /// Matcher recognizing only `*AssemblyInfo.cs`
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher that also accepts anything in `globs`
    pub fn with_globs(globs: GlobSet) -> Self {
        Self {
            extra: (!globs.is_empty()).then_some(globs),
        }
    }

    /// Check a root-relative path
    pub fn is_target(&self, relative: &Path) -> bool {
        let Some(name) = relative.file_name() else {
            return false;
        };

        if name
            .to_string_lossy()
            .to_lowercase()
            .ends_with(ASSEMBLY_INFO_SUFFIX)
        {
            return true;
        }

        self.extra
            .as_ref()
            .is_some_and(|globs| globs.is_match(relative))
    }
}

/// Collect every patch target under `root`
pub fn collect_targets(root: &Path, matcher: &TargetMatcher) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_targets_recursive(root, root, matcher, &mut files)?;

    // Sort files for deterministic order
    files.sort();

    Ok(files)
}

/// Process one directory entry, pushing targets or recursing into dirs
fn process_dir_entry(
    root: &Path,
    path: PathBuf,
    metadata: std::fs::Metadata,
    matcher: &TargetMatcher,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    if metadata.is_symlink() {
        debug!("not following symlink {}", path.display());
        return Ok(());
    }

    if metadata.is_dir() {
        if path.file_name() == Some(OsStr::new(VCS_DIR)) {
            debug!("skipping {}", path.display());
            return Ok(());
        }
        collect_targets_recursive(root, &path, matcher, files)?;
    } else if metadata.is_file() {
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if matcher.is_target(relative) {
            files.push(path);
        }
    }

    Ok(())
}

fn collect_targets_recursive(
    root: &Path,
    dir: &Path,
    matcher: &TargetMatcher,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(Error::io("failed to read directory", dir))?;

    for entry_result in entries {
        let entry = entry_result.map_err(Error::io("failed to read directory", dir))?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .map_err(Error::io("failed to read metadata", &path))?;
        process_dir_entry(root, path, metadata, matcher, files)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::{GlobBuilder, GlobSetBuilder};
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative(root: &Path, files: Vec<PathBuf>) -> Vec<String> {
        files
            .into_iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_assembly_info_suffix_case_insensitive() {
        let matcher = TargetMatcher::new();
        assert!(matcher.is_target(Path::new("Properties/AssemblyInfo.cs")));
        assert!(matcher.is_target(Path::new("ASSEMBLYINFO.CS")));
        assert!(matcher.is_target(Path::new("SharedAssemblyInfo.cs")));
        assert!(!matcher.is_target(Path::new("AssemblyInfo.vb")));
        assert!(!matcher.is_target(Path::new("AssemblyInfo.cs.bak")));
        assert!(!matcher.is_target(Path::new("Program.cs")));
    }

    #[test]
    fn test_extra_globs() {
        let mut builder = GlobSetBuilder::new();
        builder.add(
            GlobBuilder::new("**/version.h")
                .case_insensitive(true)
                .build()
                .unwrap(),
        );
        let matcher = TargetMatcher::with_globs(builder.build().unwrap());
        assert!(matcher.is_target(Path::new("version.h")));
        assert!(matcher.is_target(Path::new("firmware/Version.H")));
        assert!(matcher.is_target(Path::new("Properties/AssemblyInfo.cs")));
        assert!(!matcher.is_target(Path::new("firmware/version.c")));
    }

    #[test]
    fn test_collect_nested_targets_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Camera/Properties/AssemblyInfo.cs");
        touch(dir.path(), "Alpha/Properties/AssemblyInfo.cs");
        touch(dir.path(), "Alpha/Program.cs");
        touch(dir.path(), "README.md");

        let files = collect_targets(dir.path(), &TargetMatcher::new()).unwrap();
        assert_eq!(
            relative(dir.path(), files),
            vec![
                "Alpha/Properties/AssemblyInfo.cs",
                "Camera/Properties/AssemblyInfo.cs"
            ]
        );
    }

    #[test]
    fn test_git_directory_never_descended() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".git/AssemblyInfo.cs");
        touch(dir.path(), "sub/.git/objects/AssemblyInfo.cs");
        touch(dir.path(), "sub/AssemblyInfo.cs");

        let files = collect_targets(dir.path(), &TargetMatcher::new()).unwrap();
        assert_eq!(relative(dir.path(), files), vec!["sub/AssemblyInfo.cs"]);
    }

    #[test]
    fn test_exclusion_is_exact_and_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".GIT/AssemblyInfo.cs");
        touch(dir.path(), ".github/AssemblyInfo.cs");
        touch(dir.path(), ".vs/AssemblyInfo.cs");

        let files = collect_targets(dir.path(), &TargetMatcher::new()).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_directory_named_like_target_is_walked_not_matched() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "AssemblyInfo.cs/notes.txt");

        let files = collect_targets(dir.path(), &TargetMatcher::new()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_targets(&dir.path().join("nope"), &TargetMatcher::new()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "real/AssemblyInfo.cs");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("real/AssemblyInfo.cs"),
            dir.path().join("LinkedAssemblyInfo.cs"),
        )
        .unwrap();

        let files = collect_targets(dir.path(), &TargetMatcher::new()).unwrap();
        assert_eq!(relative(dir.path(), files), vec!["real/AssemblyInfo.cs"]);
    }
}
