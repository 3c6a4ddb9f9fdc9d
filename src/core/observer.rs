//! Per-scope composition of watcher, queue, dispatch loop and reload client.

use crate::core::dispatch::{DEFAULT_TICK_INTERVAL, DispatchLoop};
use crate::core::health::{HealthState, HealthStatus};
use crate::core::lifecycle::TaskHandle;
use crate::error::{ReloaderError, Result};
use crate::notify::{
    ChangeWatcher, DEFAULT_QUEUE_CAPACITY, Push, QueueReceiver, QueueSender, WatchStreams,
    pending_queue,
};
use crate::reload::{DEFAULT_REQUEST_TIMEOUT, ReloadClient};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span, trace};

/// Tuning knobs for an [`Observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverOptions {
    /// Interval between dispatch passes (default: 30s)
    pub tick_interval: Duration,
    /// Pending signals held before new ones are dropped (default: 50)
    pub queue_capacity: usize,
    /// Bound on a single reload call (default: 10s)
    pub request_timeout: Duration,
}

impl ObserverOptions {
    /// Reject values the dispatch loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ReloaderError::Settings`] naming the first zero field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("tick_interval", self.tick_interval.is_zero()),
            ("queue_capacity", self.queue_capacity == 0),
            ("request_timeout", self.request_timeout.is_zero()),
        ];

        for (field, zero) in checks {
            if zero {
                return Err(ReloaderError::Settings(format!("{} must be greater than 0", field)));
            }
        }
        Ok(())
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Watches one scope's paths and reloads its endpoint after writes.
///
/// Construction registers the watch but starts nothing. [`Observer::run`]
/// drives two tasks: the event loop pushes a signal per write into a bounded
/// queue, and the dispatch loop drains that queue once per tick, issuing at
/// most one reload per pass. The queue is the only thing the two share.
///
/// # Examples
///
/// ```rust,no_run
/// use provisioning_reloader::core::Observer;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> provisioning_reloader::error::Result<()> {
/// let observer = Observer::new(
///     reqwest::Client::new(),
///     "dashboards",
///     "http://localhost:3000/api/admin/provisioning/dashboards/reload",
///     ["/etc/grafana/provisioning/dashboards"],
/// )?;
///
/// let handle = observer.spawn(CancellationToken::new());
/// // ...
/// handle.shutdown(Duration::from_secs(5)).await;
/// # Ok(())
/// # }
/// ```
pub struct Observer {
    name: String,
    endpoint: String,
    client: ReloadClient,
    watcher: ChangeWatcher,
    streams: WatchStreams,
    queue_tx: QueueSender,
    queue_rx: QueueReceiver,
    tick_interval: Duration,
    health: HealthState,
}

impl Observer {
    /// Create an observer with default options.
    ///
    /// # Errors
    ///
    /// Fails if the watch cannot be created or an existing path cannot be
    /// registered. Missing paths are skipped with a warning.
    pub fn new<I, P>(
        client: reqwest::Client,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        paths: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::with_options(client, name, endpoint, paths, ObserverOptions::default())
    }

    /// Create an observer with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`Observer::new`], plus [`ReloaderError::Settings`] if
    /// `options` fails [`ObserverOptions::validate`].
    pub fn with_options<I, P>(
        client: reqwest::Client,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        paths: I,
        options: ObserverOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        options.validate()?;

        let name = name.into();
        let (watcher, streams) = {
            let _span = info_span!("observer", observer = %name).entered();
            ChangeWatcher::start(paths)?
        };
        let (queue_tx, queue_rx) = pending_queue(options.queue_capacity);

        Ok(Self {
            name,
            endpoint: endpoint.into(),
            client: ReloadClient::new(client).with_timeout(options.request_timeout),
            watcher,
            streams,
            queue_tx,
            queue_rx,
            tick_interval: options.tick_interval,
            health: HealthState::new(),
        })
    }

    /// Scope name used for log attribution.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reload endpoint this observer posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Paths actually being watched.
    pub fn watched_paths(&self) -> &[PathBuf] {
        self.watcher.watched_paths()
    }

    /// Status holder flipped to [`HealthStatus::Error`] when the loop exits.
    pub fn health(&self) -> HealthState {
        self.health.clone()
    }

    /// Run the observer as a background task.
    pub fn spawn(self, token: CancellationToken) -> TaskHandle {
        let name = self.name.clone();
        let join = tokio::spawn(self.run(token.clone()));
        TaskHandle::new(name, token, join)
    }

    /// Run until `token` is cancelled or the watcher's streams close.
    ///
    /// On exit the watch is released, the queue is closed, the dispatch loop
    /// is awaited and the health status turns to [`HealthStatus::Error`].
    pub async fn run(self, token: CancellationToken) {
        let span = info_span!("observer", observer = %self.name);
        self.run_loops(token).instrument(span).await
    }

    async fn run_loops(self, token: CancellationToken) {
        let Observer {
            name: _,
            endpoint,
            client,
            watcher,
            mut streams,
            queue_tx,
            queue_rx,
            tick_interval,
            health,
        } = self;

        debug!(files = ?watcher.watched_paths(), "watching files");

        let stop = token.child_token();
        let dispatch = DispatchLoop {
            queue: queue_rx,
            client,
            endpoint,
            tick_interval,
        };
        let mut dispatch = tokio::spawn(dispatch.run(stop.clone()).in_current_span());
        let mut dispatch_exited = false;

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                result = &mut dispatch => {
                    dispatch_exited = true;
                    match result {
                        Ok(()) => error!("dispatch loop stopped unexpectedly"),
                        Err(err) => error!(error = %err, "dispatch loop ended abnormally"),
                    }
                    break;
                }
                event = streams.events.recv() => match event {
                    Some(event) => {
                        debug!(files = ?event.paths, "config file changed");
                        if queue_tx.push() == Push::Dropped {
                            trace!("reload already pending, signal dropped");
                        }
                    }
                    None => {
                        error!("watcher event stream closed");
                        break;
                    }
                },
                err = streams.errors.recv() => match err {
                    Some(err) => error!(error = %err, "watcher error"),
                    None => {
                        error!("watcher error stream closed");
                        break;
                    }
                },
            }
        }

        watcher.close();
        drop(queue_tx);
        stop.cancel();

        if !dispatch_exited {
            if let Err(err) = dispatch.await {
                error!(error = %err, "dispatch loop ended abnormally");
            }
        }

        health.set(HealthStatus::Error);
        debug!("observer stopped");
    }
}
