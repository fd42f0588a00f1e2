//! Configuration file support for verstamp
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.verstamprc.json` in project root
//! 3. `verstamp.config.json` in project root
//!
//! All fields are optional. Without a config file the tool patches
//! `*AssemblyInfo.cs` and `SXAscomInstaller.iss` and expects `v`-prefixed tags.

use crate::patch::{PatchMode, PatchOptions, DEFAULT_INSTALLER};
use crate::version::DEFAULT_TAG_PREFIX;
use crate::walk::TargetMatcher;
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// verstamp configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerstampConfig {
    /// Installer script file name at the project root (default: SXAscomInstaller.iss)
    #[serde(default)]
    pub installer: Option<String>,

    /// Character preceding the version in tag names (default: "v")
    #[serde(default)]
    pub tag_prefix: Option<String>,

    /// Extra glob patterns for files to patch, matched case-insensitively
    #[serde(default)]
    pub include: Vec<String>,

    /// Let `git describe` use lightweight tags too (default: false)
    #[serde(default)]
    pub describe_tags: Option<bool>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub installer: String,
    pub tag_prefix: char,
    pub matcher: TargetMatcher,
    pub describe_tags: bool,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl VerstampConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref installer) = self.installer {
            if installer.trim().is_empty() {
                anyhow::bail!("installer must not be empty");
            }
            if installer.contains(['/', '\\']) || installer == "." || installer == ".." {
                anyhow::bail!(
                    "installer must be a file name at the project root (got {:?})",
                    installer
                );
            }
        }

        if let Some(ref prefix) = self.tag_prefix {
            let mut chars = prefix.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '.' && c != '-' && !c.is_whitespace() => {}
                _ => anyhow::bail!(
                    "tag_prefix must be a single character other than '.', '-' or whitespace (got {:?})",
                    prefix
                ),
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            build_glob(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.include {
            builder.add(build_glob(pattern)?);
        }
        let globs: GlobSet = builder.build()?;

        let tag_prefix = self
            .tag_prefix
            .as_deref()
            .and_then(|p| p.chars().next())
            .unwrap_or(DEFAULT_TAG_PREFIX);

        Ok(ResolvedConfig {
            installer: self
                .installer
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTALLER.to_string()),
            tag_prefix,
            matcher: TargetMatcher::with_globs(globs),
            describe_tags: self.describe_tags.unwrap_or(false),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        VerstampConfig::default().resolve()
    }

    /// Patch options for this configuration
    pub fn patch_options(&self, mode: PatchMode) -> PatchOptions {
        PatchOptions {
            matcher: self.matcher.clone(),
            installer: self.installer.clone(),
            mode,
        }
    }
}

fn build_glob(pattern: &str) -> Result<globset::Glob> {
    Ok(GlobBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.verstamprc.json`
/// 2. `verstamp.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(VerstampConfig, PathBuf)>> {
    for name in [".verstamprc.json", "verstamp.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<VerstampConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: VerstampConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (VerstampConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
