//! Filesystem watching for provisioned configuration paths.

use crate::error::{ReloaderError, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::warn;

/// Streams produced by a [`ChangeWatcher`].
///
/// Both receivers end once the watcher is closed or the notification backend
/// goes away. The owning loop treats either stream ending as terminal.
#[derive(Debug)]
pub struct WatchStreams {
    /// Write-class events on watched paths.
    pub events: mpsc::UnboundedReceiver<Event>,
    /// Errors reported by the notification backend.
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// A live subscription to write events on a fixed set of paths.
///
/// Paths are registered non-recursively: a watched directory reports writes
/// to its direct children, and children created later are not picked up.
///
/// # Examples
///
/// ```rust,no_run
/// use provisioning_reloader::notify::ChangeWatcher;
///
/// # async fn example() -> provisioning_reloader::error::Result<()> {
/// let (watcher, mut streams) = ChangeWatcher::start(["/etc/grafana/provisioning/dashboards"])?;
///
/// while let Some(event) = streams.events.recv().await {
///     println!("written: {:?}", event.paths);
/// }
/// watcher.close();
/// # Ok(())
/// # }
/// ```
pub struct ChangeWatcher {
    watcher: RecommendedWatcher,
    watched_paths: Vec<PathBuf>,
}

impl ChangeWatcher {
    /// Create the subscription and register every path in `paths`.
    ///
    /// A path that does not exist is logged and skipped. Any other
    /// registration failure aborts construction.
    ///
    /// # Errors
    ///
    /// Returns [`ReloaderError::WatcherInit`] if the backend cannot be created
    /// and [`ReloaderError::WatchPath`] if an existing path cannot be watched.
    pub fn start<I, P>(paths: I) -> Result<(Self, WatchStreams)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if is_write(&event.kind) {
                    let _ = event_tx.send(event);
                }
            }
            Err(err) => {
                let _ = error_tx.send(err);
            }
        })
        .map_err(ReloaderError::WatcherInit)?;

        let mut watched_paths = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match register(&mut watcher, path) {
                Ok(canonical) => {
                    if !watched_paths.contains(&canonical) {
                        watched_paths.push(canonical);
                    }
                }
                Err(err) if is_not_found(&err) => {
                    warn!(path = %path.display(), error = %err, "failed to add path to watcher");
                }
                Err(source) => {
                    return Err(ReloaderError::WatchPath {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }

        Ok((
            Self {
                watcher,
                watched_paths,
            },
            WatchStreams {
                events: event_rx,
                errors: error_rx,
            },
        ))
    }

    /// Paths that were successfully registered, canonicalized.
    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched_paths
    }

    /// Release the subscription. Both streams end shortly afterwards.
    ///
    /// A path that cannot be unwatched (for example because it was deleted
    /// and the backend already dropped it) is logged; closing continues.
    pub fn close(mut self) {
        for path in &self.watched_paths {
            if let Err(err) = self.watcher.unwatch(path) {
                warn!(path = %path.display(), error = %err, "failed to unwatch path");
            }
        }
    }
}

fn register(watcher: &mut RecommendedWatcher, path: &Path) -> notify::Result<PathBuf> {
    let canonical = path.canonicalize().map_err(notify::Error::io)?;
    watcher.watch(&canonical, RecursiveMode::NonRecursive)?;
    Ok(canonical)
}

fn is_not_found(err: &notify::Error) -> bool {
    match &err.kind {
        notify::ErrorKind::PathNotFound => true,
        notify::ErrorKind::Io(io_err) => io_err.kind() == io::ErrorKind::NotFound,
        _ => false,
    }
}

/// Whether an event counts as a write to watched content.
///
/// Creation, removal, renames and metadata changes (chmod, timestamps) do not
/// trigger a reload.
pub fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}
