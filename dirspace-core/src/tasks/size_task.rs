//! ``src/tasks/size_task.rs``
//! ============================================================================
//! # Size Task: One Cancellable Background Directory-Size Computation
//!
//! A `DirectoryTask` wraps a single `compute_size` run for one directory row.
//! The walk runs on the blocking pool; the outcome is sent to the delivery
//! loop as a [`SizeUpdate`] tagged with the listing generation, so stale
//! results from superseded listings are filtered out before they can touch
//! a row.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{self as TokioScheduler, JoinError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fs::size_calc::{SizeOutcome, compute_size};
use crate::model::listing::SizeState;

/// Wire format from size workers to the delivery loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeUpdate {
    /// Generation token of the listing the task was spawned for.
    pub generation: u64,

    /// Back-reference into that listing's row vector.
    pub row_index: usize,

    /// Never `Pending`: either the computed total or an error cell.
    pub result: SizeState,
}

/// Handle to one background traversal. Dropping the handle does not stop
/// the worker; only `cancel` does, cooperatively.
#[derive(Debug)]
pub struct DirectoryTask {
    target: Arc<PathBuf>,
    row_index: usize,
    generation: u64,
    cancel: CancellationToken,
}

impl DirectoryTask {
    /// Starts the traversal immediately on a background worker and returns
    /// the cancellation handle. The worker sends at most one `SizeUpdate`;
    /// a cancelled worker sends nothing.
    pub fn spawn(
        target: Arc<PathBuf>,
        row_index: usize,
        generation: u64,
        update_tx: mpsc::UnboundedSender<SizeUpdate>,
    ) -> Self {
        let cancel = CancellationToken::new();

        let task = Self {
            target: Arc::clone(&target),
            row_index,
            generation,
            cancel: cancel.clone(),
        };

        tokio::spawn(async move {
            let walk_root: Arc<PathBuf> = Arc::clone(&target);
            let walk_cancel: CancellationToken = cancel.clone();

            let outcome: Result<SizeOutcome, JoinError> =
                TokioScheduler::spawn_blocking(move || compute_size(&walk_root, &walk_cancel))
                    .await;

            let result: SizeState = match outcome {
                Ok(SizeOutcome::Value(total)) => SizeState::Value(total),

                Ok(SizeOutcome::Unreadable) => SizeState::Error,

                Ok(SizeOutcome::Cancelled) => {
                    debug!("size walk cancelled for {}", target.display());
                    return;
                }

                Err(e) => {
                    warn!("size walk for {} did not finish: {}", target.display(), e);
                    SizeState::Error
                }
            };

            // A cancel that lands after the walk finished must still keep
            // the result out of the table.
            if cancel.is_cancelled() {
                debug!("dropping result for cancelled task {}", target.display());
                return;
            }

            let _ = update_tx.send(SizeUpdate {
                generation,
                row_index,
                result,
            });
        });

        task
    }

    /// Sets the cancellation flag. Non-blocking, idempotent, safe on an
    /// already-finished task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }
}
