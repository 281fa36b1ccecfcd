//! ``src/error.rs``
//! ============================================================================
//! # `AppError`: Unified Error Type for the Directory Browser Core
//!
//! The only variant that crosses the core/UI boundary from navigation is
//! [`AppError::Unreadable`]: a directory that cannot be opened or listed.
//! Failures on individual children never surface here; they are absorbed
//! into row state as an error cell.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Unified error type for all browser-core operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The directory itself cannot be opened or listed. Navigation reports
    /// this to the caller and leaves the current listing untouched.
    #[error("Cannot read directory {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Navigation target was not an absolute path.
    #[error("Not an absolute path: {0:?}")]
    InvalidPath(PathBuf),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML config serialization error.
    #[error("Config serialize error: {0}")]
    ConfigSer(#[from] toml::ser::Error),

    /// Config file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    /// Create an unreadable-directory error.
    pub fn unreadable<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Create a config file I/O error.
    pub fn config_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    /// True for the navigation-boundary failure, false for everything else.
    #[must_use]
    pub const fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable { .. })
    }
}
