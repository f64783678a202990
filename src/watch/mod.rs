//! Change watcher.
//!
//! A notify watcher on every project root translates raw filesystem events
//! into typed [`FileChange`]s over an unbounded channel. The consumer loop
//! blocks for the first event, drains whatever else arrived, applies the
//! batch to the solution index with a bounded retry per event, then reruns
//! the generation driver. Batches are strictly sequential and the loop
//! runs for the life of the process.

use crate::driver::Driver;
use crate::error::Result;
use crate::frontend;
use crate::solution::{ChangeKind, FileChange, Solution};
use notify::event::{Event, EventKind, ModifyKind, RenameMode};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Transient I/O during event application gets this many attempts, spaced
/// this far apart, before the event is dropped.
const RETRY_ATTEMPTS: u32 = 4;
const RETRY_DELAY: Duration = Duration::from_millis(150);

/// Watches source trees and feeds the resynchronization loop.
pub struct SourceWatcher {
    // Held for its Drop; dropping it stops event delivery.
    _watcher: RecommendedWatcher,
    rx: Receiver<FileChange>,
}

impl SourceWatcher {
    /// Starts watching every root recursively. Events for non-source paths
    /// are discarded at the producer.
    pub fn new(roots: &[PathBuf]) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for change in translate(&event) {
                        let _ = tx.send(change);
                    }
                }
                Err(e) => warn!("watch event error: {e}"),
            },
            Config::default(),
        )?;
        for root in roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            info!(root = %root.display(), "watching");
        }
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// The consumer loop. Returns only when the event channel closes.
    pub fn run(self, driver: &Driver) -> Result<()> {
        loop {
            let first = match self.rx.recv() {
                Ok(change) => change,
                Err(_) => {
                    info!("watch channel closed, stopping");
                    return Ok(());
                }
            };
            let mut batch = vec![first];
            while let Ok(next) = self.rx.try_recv() {
                batch.push(next);
            }

            let started = Instant::now();
            {
                let mut state = driver.state().lock();
                let Some(solution) = state.solution_mut() else {
                    debug!("no solution declared yet, dropping batch");
                    continue;
                };
                for change in &batch {
                    apply_with_retry(solution, change);
                }
                solution.rebuild_all();
            }
            debug!(
                events = batch.len(),
                elapsed = ?started.elapsed(),
                "resynchronized index"
            );

            if let Err(e) = driver.run_pass() {
                error!("generation pass failed: {e}");
            }
        }
    }
}

fn apply_with_retry(solution: &mut Solution, change: &FileChange) {
    for attempt in 1..=RETRY_ATTEMPTS {
        match solution.process_change(change) {
            Ok(()) => return,
            Err(e) if attempt < RETRY_ATTEMPTS => {
                debug!(
                    path = %change.path.display(),
                    attempt,
                    "event application failed, retrying: {e}"
                );
                thread::sleep(RETRY_DELAY);
            }
            Err(e) => {
                warn!(
                    path = %change.path.display(),
                    "event application failed after {RETRY_ATTEMPTS} attempts, skipped: {e}"
                );
            }
        }
    }
}

/// Maps a raw notify event onto typed source changes. Renames become a
/// removal of the old path plus an addition of the new one.
fn translate(event: &Event) -> Vec<FileChange> {
    let mut out = Vec::new();
    let mut push = |path: &PathBuf, kind: ChangeKind| {
        if frontend::is_source_path(path) {
            out.push(FileChange {
                path: path.clone(),
                kind,
            });
        }
    };

    match &event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                push(path, ChangeKind::Added);
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                push(path, ChangeKind::Removed);
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::Both if event.paths.len() == 2 => {
                push(&event.paths[0], ChangeKind::Removed);
                push(&event.paths[1], ChangeKind::Added);
            }
            RenameMode::From => {
                for path in &event.paths {
                    push(path, ChangeKind::Removed);
                }
            }
            RenameMode::To => {
                for path in &event.paths {
                    push(path, ChangeKind::Added);
                }
            }
            // Backend did not say which side of the rename this is; let
            // the filesystem answer.
            _ => {
                for path in &event.paths {
                    let kind = if path.exists() {
                        ChangeKind::Added
                    } else {
                        ChangeKind::Removed
                    };
                    push(path, kind);
                }
            }
        },
        EventKind::Modify(_) => {
            for path in &event.paths {
                push(path, ChangeKind::Changed);
            }
        }
        EventKind::Any | EventKind::Access(_) | EventKind::Other => {}
    }
    out
}
