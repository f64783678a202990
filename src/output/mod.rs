//! Output reconciler.
//!
//! Templates write into named slots; the ledger records a content hash and
//! the epoch of the last commit for every destination. A commit touches
//! disk only when the content actually changed, and the end-of-pass sweep
//! deletes every destination the pass did not recommit. The ledger lives
//! for the whole process, across every generation pass.

use rustc_hash::{FxHashMap, FxHasher};
use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;

/// An open destination accumulating rendered text.
#[derive(Debug)]
pub struct OutputSlot {
    path: PathBuf,
    buffer: String,
}

impl OutputSlot {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    hash: u64,
    epoch: u64,
}

/// The per-process ledger of generated files. At most one slot is open at
/// a time; opening another commits the current one first.
#[derive(Debug, Default)]
pub struct OutputLedger {
    open: Option<OutputSlot>,
    entries: FxHashMap<PathBuf, LedgerEntry>,
}

impl OutputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path` for writing, committing the previously open slot.
    pub fn open(&mut self, path: PathBuf, epoch: u64) -> Result<()> {
        self.close(epoch)?;
        self.open = Some(OutputSlot {
            path,
            buffer: String::new(),
        });
        Ok(())
    }

    /// Appends rendered text to the open slot. Text arriving while no slot
    /// is open is dropped.
    pub fn write(&mut self, text: &str) {
        if let Some(slot) = &mut self.open {
            slot.buffer.push_str(text);
        }
    }

    pub fn has_open(&self) -> bool {
        self.open.is_some()
    }

    /// Commits the open slot, if any: stamp the epoch, write to disk only
    /// when the content hash changed. A second commit to the same path
    /// within one epoch means two writers raced for it; the last one wins.
    pub fn close(&mut self, epoch: u64) -> Result<()> {
        let Some(slot) = self.open.take() else {
            return Ok(());
        };
        let hash = content_hash(&slot.buffer);

        let previous = self.entries.get(&slot.path).copied();
        if let Some(entry) = previous {
            if entry.epoch == epoch {
                warn!(
                    path = %slot.path.display(),
                    "multiple writers for one destination in a single pass"
                );
            }
        }

        let unchanged = previous.is_some_and(|e| e.hash == hash);
        if unchanged {
            debug!(path = %slot.path.display(), "content unchanged, skipping write");
        } else {
            if let Some(parent) = slot.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&slot.path, &slot.buffer)?;
            info!(path = %slot.path.display(), bytes = slot.buffer.len(), "wrote output");
        }
        self.entries.insert(slot.path, LedgerEntry { hash, epoch });
        Ok(())
    }

    /// Deletes every ledger entry (and its file) not stamped with the
    /// current epoch. Call after the pass has closed its last slot.
    pub fn sweep(&mut self, epoch: u64) -> Result<()> {
        let stale: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(_, e)| e.epoch != epoch)
            .map(|(p, _)| p.clone())
            .collect();
        for path in stale {
            self.entries.remove(&path);
            match fs::remove_file(&path) {
                Ok(()) => info!(path = %path.display(), "removed stale output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn tracked(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    pub fn epoch_of(&self, path: &Path) -> Option<u64> {
        self.entries.get(path).map(|e| e.epoch)
    }
}

fn content_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}
