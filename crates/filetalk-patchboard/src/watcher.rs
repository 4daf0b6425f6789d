//! Background inbox watcher.
//!
//! Scans the inbox on a fixed interval and, where the platform supports it,
//! also as soon as a file lands. Stopping never interrupts a scan: the stop
//! signal is only observed between scans.

use std::path::Path;
use std::time::Duration;

use filetalk_common_async::{spawn_named, ShutdownHandle};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::inbox::{Inbox, InboxError, InboxReport};

/// Something the watcher has to tell its owner.
#[derive(Debug)]
pub enum WatchEvent {
    /// A scan that found at least one file.
    Report(InboxReport),
    /// A scan that could not list the inbox.
    Failed(InboxError),
}

/// Configures and starts an inbox watcher.
pub struct InboxWatcher {
    inbox: Inbox,
    interval: Duration,
    shutdown: ShutdownHandle,
}

/// A running watcher.
pub struct WatcherHandle {
    events: mpsc::Receiver<WatchEvent>,
    task: JoinHandle<()>,
    shutdown: ShutdownHandle,
}

/// Shortest polling interval; shorter requests are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

impl InboxWatcher {
    pub fn new(inbox: Inbox, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            debug!(?interval, "polling interval raised to the minimum");
        }
        Self {
            inbox,
            interval: interval.max(MIN_INTERVAL),
            shutdown: ShutdownHandle::new(),
        }
    }

    /// Stop when `shutdown` fires instead of only via [`WatcherHandle::stop`].
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Start watching. Must be called from within a Tokio runtime.
    pub fn spawn(self) -> WatcherHandle {
        let (tx, events) = mpsc::channel(32);
        let shutdown = self.shutdown.clone();
        // Subscribe before spawning so an early stop is not missed.
        let stop = shutdown.subscribe();
        let task = spawn_named("inbox-watcher", self.run(tx, stop));
        WatcherHandle {
            events,
            task,
            shutdown,
        }
    }

    async fn run(
        self,
        tx: mpsc::Sender<WatchEvent>,
        mut stop: tokio::sync::broadcast::Receiver<()>,
    ) {
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let _fs_watcher = watch_directory(self.inbox.dir(), wake_tx);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(inbox = %self.inbox.dir().display(), interval_ms = self.interval.as_millis() as u64, "inbox watcher started");

        loop {
            if self.shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                biased;
                _ = stop.recv() => break,
                _ = ticker.tick() => {}
                Some(()) = wake_rx.recv() => debug!("inbox change notification"),
            }

            let inbox = self.inbox.clone();
            let event = match tokio::task::spawn_blocking(move || inbox.poll()).await {
                Ok(Ok(report)) if report.is_empty() => continue,
                Ok(Ok(report)) => WatchEvent::Report(report),
                Ok(Err(e)) => {
                    warn!(error = %e, "inbox scan failed");
                    WatchEvent::Failed(e)
                }
                Err(e) => {
                    warn!(error = %e, "inbox scan task aborted");
                    break;
                }
            };

            if tx.send(event).await.is_err() {
                debug!("watcher owner gone");
                break;
            }
        }

        info!("inbox watcher stopped");
    }
}

/// Wake the watcher on file creation or rename inside `dir`.
///
/// Returns `None` when the directory cannot be watched (for example because
/// it does not exist yet); interval polling still covers it.
fn watch_directory(dir: &Path, wake: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                // A full channel already holds a pending wake-up.
                let _ = wake.try_send(());
            }
        }
    });

    let mut watcher = match watcher {
        Ok(w) => w,
        Err(e) => {
            debug!(error = %e, "file notifications unavailable, polling only");
            return None;
        }
    };
    match watcher.watch(dir, RecursiveMode::NonRecursive) {
        Ok(()) => Some(watcher),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot watch inbox, polling only");
            None
        }
    }
}

impl WatcherHandle {
    /// Next event, or `None` once the watcher has stopped.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }

    /// Ask the watcher to stop after any scan in progress.
    pub fn stop(&self) {
        self.shutdown.shutdown();
    }

    /// Wait for the watcher task to finish.
    ///
    /// Returns the events not yet taken with [`next_event`](Self::next_event),
    /// including the result of a scan that was running when stop was asked.
    /// Their files are already consumed, so they must not be dropped.
    pub async fn join(mut self) -> Result<Vec<WatchEvent>, tokio::task::JoinError> {
        let mut pending = Vec::new();
        while let Some(event) = self.events.recv().await {
            pending.push(event);
        }
        self.task.await?;
        Ok(pending)
    }
}
