// LogWeave - app/watcher.rs
//
// Workspace change detection by polling. Every poll interval the watcher
// re-discovers the workspace and compares an mtime/size snapshot against
// the previous one; any difference is reported as a `WatchEvent` on an
// mpsc channel. Events only signal that parsed caches are stale — the
// receiver decides when to actually regenerate.
//
// Polling rather than OS notification keeps behaviour identical across
// platforms and network shares, at the cost of up to one poll interval
// of latency.

use crate::core::discovery;
use crate::util::constants::{WATCH_CANCEL_CHECK_INTERVAL_MS, WATCH_POLL_INTERVAL_MS};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A single observed file-system change in the watched workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Per-file fingerprint; a change in either field counts as modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    size: u64,
}

type Snapshot = HashMap<PathBuf, Fingerprint>;

/// Handle to a running watcher thread. Dropping the handle does NOT stop
/// the thread; call `stop()` (or share the cancel flag) to end it.
pub struct WatcherHandle {
    cancel: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl WatcherHandle {
    /// Signal the watcher loop to exit and wait for it.
    pub fn stop(mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the polling loop for `root`, sending events to `tx`.
///
/// The loop exits when `cancel` becomes true; the cancel flag is checked
/// every `WATCH_CANCEL_CHECK_INTERVAL_MS` so shutdown stays responsive
/// within the poll interval.
pub fn spawn(root: PathBuf, tx: Sender<WatchEvent>, cancel: Arc<AtomicBool>) -> WatcherHandle {
    let thread_cancel = Arc::clone(&cancel);
    let thread = std::thread::spawn(move || {
        watch_loop(&root, &tx, &thread_cancel);
    });
    WatcherHandle {
        cancel,
        thread: Some(thread),
    }
}

/// Convenience wrapper that also creates the channel.
pub fn watch(root: PathBuf, cancel: Arc<AtomicBool>) -> (WatcherHandle, Receiver<WatchEvent>) {
    let (tx, rx) = std::sync::mpsc::channel();
    (spawn(root, tx, cancel), rx)
}

fn watch_loop(root: &PathBuf, tx: &Sender<WatchEvent>, cancel: &AtomicBool) {
    let mut previous = match take_snapshot(root, cancel) {
        Some(snapshot) => snapshot,
        None => return,
    };
    tracing::debug!(root = %root.display(), files = previous.len(), "Watcher started");

    loop {
        if !sleep_poll_interval(cancel) {
            tracing::debug!("Watcher stopped");
            return;
        }

        let current = match take_snapshot(root, cancel) {
            Some(snapshot) => snapshot,
            None => return,
        };

        for event in diff(&previous, &current) {
            if tx.send(event).is_err() {
                // Receiver gone; nothing left to notify.
                return;
            }
        }
        previous = current;
    }
}

/// Sleep for one poll interval in cancel-check increments.
/// Returns false when cancelled.
fn sleep_poll_interval(cancel: &AtomicBool) -> bool {
    let mut slept = 0;
    while slept < WATCH_POLL_INTERVAL_MS {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(WATCH_CANCEL_CHECK_INTERVAL_MS));
        slept += WATCH_CANCEL_CHECK_INTERVAL_MS;
    }
    !cancel.load(Ordering::SeqCst)
}

/// Fingerprint every discoverable log and HAR file under `root`.
///
/// Discovery errors end the watcher (the workspace is gone or was never
/// valid); per-file stat errors just omit that file, which the next diff
/// reports as removed.
fn take_snapshot(root: &PathBuf, cancel: &AtomicBool) -> Option<Snapshot> {
    let found = match discovery::discover(root, cancel) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "Watcher discovery failed; stopping");
            return None;
        }
    };

    let mut snapshot = Snapshot::new();
    for path in found.log_files.iter().chain(found.har_files.iter()) {
        if let Ok(meta) = std::fs::metadata(path) {
            snapshot.insert(
                path.clone(),
                Fingerprint {
                    modified: meta.modified().ok(),
                    size: meta.len(),
                },
            );
        }
    }
    Some(snapshot)
}

fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<WatchEvent> {
    let mut events = Vec::new();

    for (path, fingerprint) in current {
        match previous.get(path) {
            None => events.push(WatchEvent::Created(path.clone())),
            Some(old) if old != fingerprint => events.push(WatchEvent::Changed(path.clone())),
            Some(_) => {}
        }
    }
    for path in previous.keys() {
        if !current.contains_key(path) {
            events.push(WatchEvent::Removed(path.clone()));
        }
    }

    events
}

// =============================================================================
// Tests
// =============================================================================
