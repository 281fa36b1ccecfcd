//! ``src/fs/entry_info.rs``
//! ============================================================================
//! # `EntryInfo`: Immutable Per-Child Metadata
//!
//! One `EntryInfo` per immediate child of the opened directory, built from
//! `symlink_metadata` so symbolic links are never followed. The struct is
//! frozen at listing construction; size resolution lives in the row state,
//! not here.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compact_str::CompactString;

/// Directory child classification. Anything that is not a directory —
/// regular files, symlinks, sockets — counts as `File` and resolves its
/// size synchronously from its own metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "File"),
            Self::Dir => write!(f, "Dir"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Shared absolute path, full path for traversal.
    pub path: Arc<PathBuf>,

    /// Final path segment for display.
    pub name: CompactString,

    pub kind: EntryKind,
}

impl EntryInfo {
    /// Constant-time directory check.
    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Dir)
    }

    /// Classifies `path` without following symlinks, returning the metadata
    /// alongside so the caller can resolve file sizes without a second
    /// `stat` call.
    pub fn from_path_with_meta(path: &Path) -> std::io::Result<(Self, Metadata)> {
        let meta: Metadata = fs::symlink_metadata(path)?;

        let kind: EntryKind = if meta.file_type().is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        let info = Self {
            path: Arc::new(path.to_path_buf()),
            name: display_name(path),
            kind,
        };

        Ok((info, meta))
    }

    /// Placeholder for a child whose attributes could not be read. The row
    /// keeps its slot in the listing with an error cell; no task is spawned.
    #[must_use]
    pub fn unclassified(path: &Path) -> Self {
        Self {
            path: Arc::new(path.to_path_buf()),
            name: display_name(path),
            kind: EntryKind::File,
        }
    }
}

fn display_name(path: &Path) -> CompactString {
    CompactString::new(path.file_name().and_then(OsStr::to_str).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, [0u8; 42]).unwrap();

        let (info, meta) = EntryInfo::from_path_with_meta(&file).unwrap();

        assert_eq!(info.kind, EntryKind::File);
        assert_eq!(info.name, "data.bin");
        assert_eq!(meta.len(), 42);
        assert!(!info.is_dir());
    }

    #[test]
    fn classifies_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let (info, _meta) = EntryInfo::from_path_with_meta(&sub).unwrap();

        assert_eq!(info.kind, EntryKind::Dir);
        assert!(info.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_is_not_a_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let (info, _meta) = EntryInfo::from_path_with_meta(&link).unwrap();

        // symlink_metadata: the link itself, never the target
        assert_eq!(info.kind, EntryKind::File);
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(EntryInfo::from_path_with_meta(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn unclassified_keeps_the_display_name() {
        let info = EntryInfo::unclassified(Path::new("/some/where/locked"));

        assert_eq!(info.name, "locked");
        assert_eq!(info.kind, EntryKind::File);
    }
}
