//! ``src/model/listing.rs``
//! ============================================================================
//! # `Listing`: Snapshot of One Directory's Immediate Children
//!
//! Enumerates the children of a directory at open time, resolves file rows
//! synchronously, and spawns one `DirectoryTask` per subdirectory row before
//! `open` returns. The row set is frozen after construction; only the
//! delivery loop mutates row size cells, through `set_row_size`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, DirEntry, ReadDir};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::fs::entry_info::{EntryInfo, EntryKind};
use crate::tasks::size_task::{DirectoryTask, SizeUpdate};

/// Resolution state of one row's size cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeState {
    /// A background traversal is still running for this row.
    Pending,

    /// Exact byte total.
    Value(u64),

    /// The entry's attributes could not be read, or its tree could not be
    /// entered at all.
    Error,
}

impl SizeState {
    #[inline]
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// One table row: frozen entry metadata plus its mutable size cell.
#[derive(Debug, Clone)]
pub struct Row {
    pub entry: EntryInfo,
    pub size: SizeState,
}

/// Snapshot of one directory's immediate children plus the background tasks
/// it owns. Row order is filesystem enumeration order; sorting is the UI's
/// concern.
#[derive(Debug)]
pub struct Listing {
    dir: Arc<PathBuf>,
    generation: u64,
    rows: Vec<Row>,
    tasks: Vec<DirectoryTask>,
}

impl Listing {
    /// Enumerates `dir` and builds the snapshot.
    ///
    /// Fails with [`AppError::Unreadable`] only if `dir` itself cannot be
    /// listed. A child whose attributes cannot be read keeps its row with an
    /// error cell. Every subdirectory row has its task running before this
    /// returns, so a later `cancel_all` can never miss one.
    pub async fn open(
        dir: &Path,
        generation: u64,
        show_hidden: bool,
        update_tx: &mpsc::UnboundedSender<SizeUpdate>,
    ) -> Result<Self, AppError> {
        let mut read_dir: ReadDir = fs::read_dir(dir)
            .await
            .map_err(|e| AppError::unreadable(dir, e))?;

        let mut rows: Vec<Row> = Vec::new();
        let mut tasks: Vec<DirectoryTask> = Vec::new();

        while let Some(entry_result) = read_dir.next_entry().await.transpose() {
            let entry: DirEntry = match entry_result {
                Ok(e) => e,

                Err(e) => {
                    info!("skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };

            let entry_path: PathBuf = entry.path();

            if !show_hidden && is_hidden(&entry_path) {
                continue;
            }

            let row_index: usize = rows.len();

            match EntryInfo::from_path_with_meta(&entry_path) {
                Ok((entry_info, meta)) => match entry_info.kind {
                    EntryKind::Dir => {
                        tasks.push(DirectoryTask::spawn(
                            Arc::clone(&entry_info.path),
                            row_index,
                            generation,
                            update_tx.clone(),
                        ));
                        rows.push(Row {
                            entry: entry_info,
                            size: SizeState::Pending,
                        });
                    }

                    EntryKind::File => rows.push(Row {
                        entry: entry_info,
                        size: SizeState::Value(meta.len()),
                    }),
                },

                Err(e) => {
                    // attributes unreadable: keep the row, show an error cell
                    info!("cannot stat {}: {}", entry_path.display(), e);
                    rows.push(Row {
                        entry: EntryInfo::unclassified(&entry_path),
                        size: SizeState::Error,
                    });
                }
            }
        }

        Ok(Self {
            dir: Arc::new(dir.to_path_buf()),
            generation,
            rows,
            tasks,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Arc<PathBuf> {
        &self.dir
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True while any directory row is still awaiting its total.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.rows.iter().any(|row: &Row| row.size.is_pending())
    }

    #[must_use]
    pub fn tasks(&self) -> &[DirectoryTask] {
        &self.tasks
    }

    /// Fire-and-forget cancellation of every owned task. Does not wait for
    /// workers to observe the flag.
    pub fn cancel_all(&self) {
        for task in &self.tasks {
            task.cancel();
        }
    }

    /// Writes a delivered size into its row. Only rows still `Pending`
    /// accept a write; a row transitions at most once after construction.
    pub(crate) fn set_row_size(&mut self, index: usize, result: SizeState) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if row.size.is_pending() => {
                row.size = result;
                true
            }

            Some(row) => {
                debug!(
                    "ignoring duplicate size delivery for resolved row {} ({})",
                    index, row.entry.name
                );
                false
            }

            None => {
                debug!("ignoring size delivery for out-of-range row {}", index);
                false
            }
        }
    }
}

// Superseded listings are cancelled explicitly by the navigator before the
// swap; this covers every other way a listing can go away.
impl Drop for Listing {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s: &std::ffi::OsStr| s.to_str())
        .unwrap_or("")
        .starts_with('.')
}
