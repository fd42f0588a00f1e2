//! Error types for version resolution and file patching
//!
//! Every variant is terminal for a run. Nothing is retried.

use std::path::PathBuf;

/// Errors raised by the core library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The `git describe` output could not be split into major/minor
    #[error("malformed descriptor {descriptor:?}: {reason}")]
    MalformedDescriptor {
        descriptor: String,
        reason: &'static str,
    },

    /// A mandatory patch target does not exist
    #[error("required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A file or directory could not be opened, read or written
    #[error("{action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source-control query exited with a non-zero status
    #[error("git {} returned non-zero status", .args.join(" "))]
    Git {
        args: Vec<String>,
        /// Exit code of the git process, `None` if it was killed by a signal
        code: Option<i32>,
        stderr: String,
    },
}

impl Error {
    pub(crate) fn malformed(descriptor: &str, reason: &'static str) -> Self {
        Error::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason,
        }
    }

    /// Build a `map_err` adapter that attaches the action and path
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io {
            action,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
