//! ``src/model/navigator.rs``
//! ============================================================================
//! # `Navigator`: Current-Listing Owner and Delivery Loop
//!
//! Owns the current [`Listing`] and the generation counter behind one mutex,
//! and spawns the single delivery loop that applies worker results to row
//! state. `navigate_to` holds the state lock across open -> cancel-old ->
//! swap, so a result can never race the swap; anything from a superseded
//! generation is dropped by the loop.
//!
//! All row writes happen on the delivery loop, under the same mutex the
//! accessors take; collaborators learn about changes through a coarse
//! `watch` revision counter and re-read rows.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, MutexGuard, mpsc, watch};
use tracing::{debug, info};

use crate::error::AppError;
use crate::model::listing::{Listing, Row};
use crate::tasks::size_task::SizeUpdate;

#[derive(Debug)]
struct NavState {
    /// `None` only before the first successful navigation.
    listing: Option<Listing>,

    /// Last allocated generation token; the current listing carries it.
    generation: u64,
}

/// The only component permitted to cancel a listing's tasks, and only when
/// superseding it.
#[derive(Debug)]
pub struct Navigator {
    state: Arc<Mutex<NavState>>,
    update_tx: UnboundedSender<SizeUpdate>,
    changed_tx: watch::Sender<u64>,
    show_hidden: bool,
}

impl Navigator {
    /// Creates the navigator and spawns its delivery loop. Must be called
    /// inside a Tokio runtime.
    #[must_use]
    pub fn new(show_hidden: bool) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel::<SizeUpdate>();
        let (changed_tx, _) = watch::channel(0u64);

        let state = Arc::new(Mutex::new(NavState {
            listing: None,
            generation: 0,
        }));

        tokio::spawn(deliver_updates(
            Arc::clone(&state),
            update_rx,
            changed_tx.clone(),
        ));

        Self {
            state,
            update_tx,
            changed_tx,
            show_hidden,
        }
    }

    /// Opens `path` and swaps it in as the current listing.
    ///
    /// On failure the current listing, its tasks, and the displayed path are
    /// left exactly as they were. Navigating to the directory already shown
    /// (after lexical normalization) is a no-op that keeps running tasks.
    pub async fn navigate_to(&self, path: &Path) -> Result<(), AppError> {
        if !path.is_absolute() {
            return Err(AppError::InvalidPath(path.to_path_buf()));
        }

        let target: PathBuf = normalize(path);

        let mut nav: MutexGuard<'_, NavState> = self.state.lock().await;

        if let Some(current) = nav.listing.as_ref()
            && **current.dir() == target
        {
            debug!("already showing {}, keeping listing", target.display());
            return Ok(());
        }

        let generation: u64 = nav.generation + 1;

        // Spawns one task per subdirectory before returning; a failed open
        // leaves `nav` untouched.
        let listing: Listing =
            Listing::open(&target, generation, self.show_hidden, &self.update_tx).await?;

        nav.generation = generation;

        // Cancel the superseded listing before the new rows become visible.
        // Its workers may still be running; their results carry a stale
        // generation and the delivery loop drops them.
        if let Some(old) = nav.listing.take() {
            old.cancel_all();
        }

        info!(
            "now showing {} ({} rows, generation {})",
            target.display(),
            listing.row_count(),
            generation
        );
        nav.listing = Some(listing);
        drop(nav);

        self.changed_tx.send_modify(|rev: &mut u64| *rev += 1);
        Ok(())
    }

    /// Navigates into the directory at `index`. File rows and out-of-range
    /// indices are ignored.
    pub async fn enter_row(&self, index: usize) -> Result<(), AppError> {
        let target: Option<Arc<PathBuf>> = {
            let nav = self.state.lock().await;
            nav.listing
                .as_ref()
                .and_then(|listing: &Listing| listing.row(index))
                .filter(|row: &&Row| row.entry.is_dir())
                .map(|row: &Row| Arc::clone(&row.entry.path))
        };

        match target {
            Some(path) => self.navigate_to(&path).await,
            None => Ok(()),
        }
    }

    /// Navigates to the parent of the current directory. A missing parent,
    /// or one that cannot be classified as a directory, is ignored.
    pub async fn go_to_parent(&self) -> Result<(), AppError> {
        let parent: Option<PathBuf> = {
            let nav = self.state.lock().await;
            nav.listing
                .as_ref()
                .and_then(|listing: &Listing| listing.dir().parent())
                .map(Path::to_path_buf)
        };

        let Some(parent) = parent else {
            return Ok(());
        };

        match fs::symlink_metadata(&parent).await {
            Ok(meta) if meta.is_dir() => self.navigate_to(&parent).await,
            _ => Ok(()),
        }
    }

    /// Directory of the current listing, `None` before the first successful
    /// navigation.
    pub async fn current_dir(&self) -> Option<Arc<PathBuf>> {
        let nav = self.state.lock().await;
        nav.listing
            .as_ref()
            .map(|listing: &Listing| Arc::clone(listing.dir()))
    }

    pub async fn row_count(&self) -> usize {
        let nav = self.state.lock().await;
        nav.listing.as_ref().map_or(0, Listing::row_count)
    }

    pub async fn row(&self, index: usize) -> Option<Row> {
        let nav = self.state.lock().await;
        nav.listing
            .as_ref()
            .and_then(|listing: &Listing| listing.row(index))
            .cloned()
    }

    /// Cloned snapshot of every row, in enumeration order.
    pub async fn rows(&self) -> Vec<Row> {
        let nav = self.state.lock().await;
        nav.listing
            .as_ref()
            .map_or_else(Vec::new, |listing: &Listing| listing.rows().to_vec())
    }

    /// True while any row of the current listing awaits its total.
    pub async fn has_pending(&self) -> bool {
        let nav = self.state.lock().await;
        nav.listing.as_ref().is_some_and(Listing::has_pending)
    }

    /// Coarse "one or more rows changed" signal: the revision bumps on every
    /// applied size delivery and on every listing swap.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed_tx.subscribe()
    }
}

/// The row-owner context: the single consumer of worker results. Ends when
/// the navigator and every outstanding worker have gone away.
async fn deliver_updates(
    state: Arc<Mutex<NavState>>,
    mut update_rx: UnboundedReceiver<SizeUpdate>,
    changed_tx: watch::Sender<u64>,
) {
    while let Some(update) = update_rx.recv().await {
        let mut nav: MutexGuard<'_, NavState> = state.lock().await;

        let Some(listing) = nav.listing.as_mut() else {
            continue;
        };

        if listing.generation() != update.generation {
            debug!(
                "dropping stale size result (generation {} != current {})",
                update.generation,
                listing.generation()
            );
            continue;
        }

        if listing.set_row_size(update.row_index, update.result) {
            changed_tx.send_modify(|rev: &mut u64| *rev += 1);
        }
    }
}

/// Lexical normalization: folds `.` and `..` components without touching
/// the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::listing::SizeState;
    use std::fs as StdFs;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(10);

    /// Waits until no row of the current listing is pending.
    async fn wait_resolved(nav: &Navigator) {
        let mut changes = nav.subscribe();
        timeout(WAIT, async {
            while nav.has_pending().await {
                changes.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
    }

    async fn row_by_name(nav: &Navigator, name: &str) -> (usize, Row) {
        nav.rows()
            .await
            .into_iter()
            .enumerate()
            .find(|(_, row)| row.entry.name == name)
            .unwrap()
    }

    async fn current_generation(nav: &Navigator) -> u64 {
        nav.state.lock().await.generation
    }

    async fn current_path(nav: &Navigator) -> Option<PathBuf> {
        nav.current_dir().await.map(|dir| (*dir).clone())
    }

    #[tokio::test]
    async fn files_resolve_immediately_directories_eventually() {
        let dir = tempfile::tempdir().unwrap();
        StdFs::write(dir.path().join("f"), [0u8; 100]).unwrap();
        let sub = dir.path().join("d");
        StdFs::create_dir(&sub).unwrap();
        StdFs::write(sub.join("inner"), [0u8; 50]).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(dir.path()).await.unwrap();

        assert_eq!(current_path(&nav).await.as_deref(), Some(dir.path()));
        let (_, f) = row_by_name(&nav, "f").await;
        assert_eq!(f.size, SizeState::Value(100));

        wait_resolved(&nav).await;

        let (_, d) = row_by_name(&nav, "d").await;
        assert_eq!(d.size, SizeState::Value(50));
    }

    #[tokio::test]
    async fn renavigation_recomputes_instead_of_carrying_stale_sizes() {
        let a = tempfile::tempdir().unwrap();
        let a_sub = a.path().join("d");
        StdFs::create_dir(&a_sub).unwrap();
        StdFs::write(a_sub.join("one"), [0u8; 50]).unwrap();
        let b = tempfile::tempdir().unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(a.path()).await.unwrap();
        wait_resolved(&nav).await;
        let (_, d) = row_by_name(&nav, "d").await;
        assert_eq!(d.size, SizeState::Value(50));

        nav.navigate_to(b.path()).await.unwrap();

        // the tree changes while we are away; a fresh walk must see it
        StdFs::write(a_sub.join("two"), [0u8; 25]).unwrap();

        nav.navigate_to(a.path()).await.unwrap();
        wait_resolved(&nav).await;

        let (_, d) = row_by_name(&nav, "d").await;
        assert_eq!(d.size, SizeState::Value(75));
    }

    #[tokio::test]
    async fn stale_generation_results_never_reach_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("d");
        StdFs::create_dir(&sub).unwrap();
        StdFs::write(sub.join("inner"), [0u8; 50]).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(dir.path()).await.unwrap();
        let (d_index, _) = row_by_name(&nav, "d").await;

        // forged result from a generation that is not current
        nav.update_tx
            .send(SizeUpdate {
                generation: 999,
                row_index: d_index,
                result: SizeState::Value(123_456),
            })
            .unwrap();

        wait_resolved(&nav).await;

        let (_, d) = row_by_name(&nav, "d").await;
        assert_eq!(d.size, SizeState::Value(50));
    }

    #[tokio::test]
    async fn superseded_listings_tasks_are_cancelled_and_never_visible() {
        let a = tempfile::tempdir().unwrap();
        let a_sub = a.path().join("big");
        StdFs::create_dir(&a_sub).unwrap();
        for i in 0..200 {
            StdFs::write(a_sub.join(format!("f{i}")), [0u8; 8]).unwrap();
        }

        let b = tempfile::tempdir().unwrap();
        let b_sub = b.path().join("d");
        StdFs::create_dir(&b_sub).unwrap();
        StdFs::write(b_sub.join("inner"), [0u8; 30]).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(a.path()).await.unwrap();
        // supersede immediately, without waiting for a's walk
        nav.navigate_to(b.path()).await.unwrap();

        {
            let state = nav.state.lock().await;
            let listing = state.listing.as_ref().unwrap();
            assert_eq!(**listing.dir(), b.path());
        }

        wait_resolved(&nav).await;

        // whatever a's worker did, b's single row holds b's total
        let rows = nav.rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.name, "d");
        assert_eq!(rows[0].size, SizeState::Value(30));
    }

    #[tokio::test]
    async fn failed_navigation_leaves_everything_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        StdFs::write(dir.path().join("f"), [0u8; 10]).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(dir.path()).await.unwrap();
        wait_resolved(&nav).await;
        let before = nav.rows().await;
        let generation_before = current_generation(&nav).await;

        let err = nav
            .navigate_to(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(err.is_unreadable());

        assert_eq!(current_path(&nav).await.as_deref(), Some(dir.path()));
        assert_eq!(current_generation(&nav).await, generation_before);
        let after = nav.rows().await;
        assert_eq!(after.len(), before.len());
        for (x, y) in before.iter().zip(&after) {
            assert_eq!(x.entry, y.entry);
            assert_eq!(x.size, y.size);
        }
    }

    #[tokio::test]
    async fn relative_targets_are_rejected() {
        let nav = Navigator::new(true);

        let err = nav.navigate_to(Path::new("relative/path")).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidPath(_)));
        assert!(nav.current_dir().await.is_none());
    }

    #[tokio::test]
    async fn same_directory_navigation_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("d");
        StdFs::create_dir(&sub).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(dir.path()).await.unwrap();
        wait_resolved(&nav).await;
        let generation_before = current_generation(&nav).await;

        // plain repeat, and a spelling that normalizes to the same directory
        nav.navigate_to(dir.path()).await.unwrap();
        let respelled = dir.path().join("d").join("..").join(".");
        nav.navigate_to(&respelled).await.unwrap();

        assert_eq!(current_generation(&nav).await, generation_before);
        let (_, d) = row_by_name(&nav, "d").await;
        assert!(!d.size.is_pending());
    }

    #[tokio::test]
    async fn enter_row_descends_into_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        StdFs::write(dir.path().join("f"), [0u8; 1]).unwrap();
        let sub = dir.path().join("d");
        StdFs::create_dir(&sub).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(dir.path()).await.unwrap();

        let (f_index, _) = row_by_name(&nav, "f").await;
        nav.enter_row(f_index).await.unwrap();
        assert_eq!(current_path(&nav).await.as_deref(), Some(dir.path()));

        nav.enter_row(usize::MAX).await.unwrap();
        assert_eq!(current_path(&nav).await.as_deref(), Some(dir.path()));

        let (d_index, _) = row_by_name(&nav, "d").await;
        nav.enter_row(d_index).await.unwrap();
        assert_eq!(current_path(&nav).await.as_deref(), Some(sub.as_path()));
    }

    #[tokio::test]
    async fn go_to_parent_climbs_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("d");
        StdFs::create_dir(&sub).unwrap();

        let nav = Navigator::new(true);
        nav.navigate_to(&sub).await.unwrap();

        nav.go_to_parent().await.unwrap();

        assert_eq!(current_path(&nav).await.as_deref(), Some(dir.path()));
    }

    #[test]
    fn normalize_folds_dot_and_dotdot() {
        assert_eq!(normalize(Path::new("/a/b/../c/.")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/a")), PathBuf::from("/a"));
    }
}
