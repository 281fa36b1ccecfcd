//! ``src/fs/size_calc.rs``
//! ============================================================================
//! # Size Calculator: Cancellable Recursive Directory Size
//!
//! Blocking depth-first walk summing regular-file byte lengths. Runs on the
//! blocking pool, owned by a `DirectoryTask`; never mutates shared state.
//! The cancellation token is checked before the walk starts and once per
//! visited entry.

use std::fs;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

/// Terminal outcome of one traversal. `Cancelled` means "no answer" and is
/// never written into a row; it is distinct from `Unreadable`, which is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOutcome {
    /// Sum of all regular-file byte lengths reachable without crossing a
    /// symbolic link.
    Value(u64),

    /// The root itself could not be listed.
    Unreadable,

    /// The token was set before or during the walk.
    Cancelled,
}

/// Computes the recursive size of the tree rooted at `root`.
///
/// Failures below the root contribute zero and the walk continues; only a
/// root that cannot be listed at all yields [`SizeOutcome::Unreadable`].
/// Symbolic links are leaves: never descended into, never counted.
pub fn compute_size(root: &Path, cancel: &CancellationToken) -> SizeOutcome {
    if cancel.is_cancelled() {
        return SizeOutcome::Cancelled;
    }

    if let Err(e) = fs::read_dir(root) {
        debug!("cannot list {}: {}", root.display(), e);
        return SizeOutcome::Unreadable;
    }

    let mut total: u64 = 0;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        if cancel.is_cancelled() {
            return SizeOutcome::Cancelled;
        }

        if entry.file_type().is_file()
            && let Ok(metadata) = entry.metadata()
        {
            total += metadata.len();
        }
    }

    SizeOutcome::Value(total)
}
