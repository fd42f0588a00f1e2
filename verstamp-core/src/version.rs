//! Version resolution
//!
//! Turns a `git describe` descriptor (or an explicit major/minor pair) plus a
//! wall-clock timestamp into a four-part [`VersionTuple`].
//!
//! Global invariants enforced:
//! - Only major and minor survive from the descriptor
//! - Revision is always 5 characters (`%y%j`), build always 4 (`%H%M`)
//! - No I/O and no clock reads; the caller supplies `now`

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use std::fmt;

/// Default tag prefix (`v1.2.0`)
pub const DEFAULT_TAG_PREFIX: char = 'v';

/// A resolved `major.minor.revision.build` version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTuple {
    pub major: u32,
    pub minor: u32,
    /// Two-digit year followed by zero-padded day-of-year, e.g. `24091`
    pub revision: String,
    /// Zero-padded hour and minute, e.g. `0905`
    pub build: String,
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.revision, self.build
        )
    }
}

/// Major/minor supplied on the command line instead of taken from the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitVersion {
    pub major: u32,
    pub minor: u32,
}

/// Compute the revision and build tokens for a timestamp
pub fn stamp(now: NaiveDateTime) -> (String, String) {
    (
        now.format("%y%j").to_string(),
        now.format("%H%M").to_string(),
    )
}

/// Extract major and minor from a descriptor such as `v1.2.0-5-gabcdef`
///
/// The commit-count and hash segments are discarded, as is anything past the
/// minor component.
pub fn parse_descriptor(descriptor: &str, tag_prefix: char) -> Result<(u32, u32)> {
    let trimmed = descriptor.trim();
    let core = trimmed.split('-').next().unwrap_or_default();

    let Some(dotted) = core.strip_prefix(tag_prefix) else {
        return Err(Error::malformed(trimmed, "missing tag prefix"));
    };

    let mut parts = dotted.splitn(3, '.');
    let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
        return Err(Error::malformed(trimmed, "expected at least major.minor"));
    };

    let major = major
        .parse::<u32>()
        .map_err(|_| Error::malformed(trimmed, "major is not a number"))?;
    let minor = minor
        .parse::<u32>()
        .map_err(|_| Error::malformed(trimmed, "minor is not a number"))?;

    Ok((major, minor))
}

/// Resolve the full version tuple
///
/// When `explicit` is given the descriptor is not parsed at all, so a
/// malformed descriptor is not an error in that case.
pub fn resolve(
    descriptor: &str,
    explicit: Option<ExplicitVersion>,
    now: NaiveDateTime,
    tag_prefix: char,
) -> Result<VersionTuple> {
    let (major, minor) = match explicit {
        Some(ExplicitVersion { major, minor }) => (major, minor),
        None => parse_descriptor(descriptor, tag_prefix)?,
    };
    let (revision, build) = stamp(now);

    Ok(VersionTuple {
        major,
        minor,
        revision,
        build,
    })
}
