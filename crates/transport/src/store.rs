//! Queue stores - ordered, durable storage for pending events
//!
//! A store holds `QueueEntry` rows in FIFO order. The file-backed store is
//! keyed by a stable tracker identifier so a freshly constructed engine after
//! a process restart resumes exactly where the previous one stopped. Each
//! tracker identity must own its store exclusively; concurrent trackers use
//! distinct keys.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use spoor_schema::TrackerEvent;

use crate::error::{Result, TransportError};

/// One pending event plus the moment it entered the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub event: TrackerEvent,

    /// Epoch millis at enqueue time; drives the batch-delay threshold
    pub enqueued_at: i64,
}

/// Ordered storage for pending queue entries.
///
/// All operations preserve FIFO order. `push_front` exists so a failed batch
/// can be returned ahead of newer entries without reordering.
pub trait QueueStore: Send + Sync {
    /// Append entries at the tail
    fn append(&self, entries: Vec<QueueEntry>) -> Result<()>;

    /// Remove and return up to `n` entries from the head
    fn take_head(&self, n: usize) -> Result<Vec<QueueEntry>>;

    /// Put entries back at the head, preserving their relative order
    fn push_front(&self, entries: Vec<QueueEntry>) -> Result<()>;

    /// Number of pending entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `enqueued_at` of the head entry, if any
    fn oldest_enqueued_at(&self) -> Option<i64>;

    /// Drop all pending entries
    fn clear(&self) -> Result<()>;
}

/// Volatile in-memory store. Does not survive a restart; useful for tests
/// and for environments without durable storage.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    entries: Mutex<VecDeque<QueueEntry>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryQueueStore {
    fn append(&self, entries: Vec<QueueEntry>) -> Result<()> {
        self.entries.lock().extend(entries);
        Ok(())
    }

    fn take_head(&self, n: usize) -> Result<Vec<QueueEntry>> {
        let mut guard = self.entries.lock();
        let count = n.min(guard.len());
        Ok(guard.drain(..count).collect())
    }

    fn push_front(&self, entries: Vec<QueueEntry>) -> Result<()> {
        let mut guard = self.entries.lock();
        for entry in entries.into_iter().rev() {
            guard.push_front(entry);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn oldest_enqueued_at(&self) -> Option<i64> {
        self.entries.lock().front().map(|entry| entry.enqueued_at)
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

/// Durable store backed by one JSON file per tracker identity.
///
/// The full pending queue is loaded into memory at construction and written
/// back after every mutation via write-to-temp-then-rename, so the on-disk
/// file is always a complete, parseable snapshot even if the process dies
/// mid-write.
pub struct FileQueueStore {
    path: PathBuf,
    entries: Mutex<VecDeque<QueueEntry>>,
}

impl FileQueueStore {
    /// Open (or create) the store for `key` inside `dir`.
    pub fn open(dir: impl Into<PathBuf>, key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(TransportError::Store("store key must not be empty".into()));
        }

        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| TransportError::Store(format!("create {}: {e}", dir.display())))?;
        let path = dir.join(format!("spoor-queue-{key}.json"));

        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Vec<QueueEntry>>(&bytes)
                .map_err(|e| TransportError::Store(format!("parse {}: {e}", path.display())))?
                .into(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => {
                return Err(TransportError::Store(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };

        tracing::debug!(path = %path.display(), pending = entries.len(), "queue store opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn persist(&self, entries: &VecDeque<QueueEntry>) -> Result<()> {
        let snapshot: Vec<&QueueEntry> = entries.iter().collect();
        let bytes = serde_json::to_vec(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .map_err(|e| TransportError::Store(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| TransportError::Store(format!("rename {}: {e}", self.path.display())))?;
        Ok(())
    }
}

impl QueueStore for FileQueueStore {
    fn append(&self, entries: Vec<QueueEntry>) -> Result<()> {
        let mut guard = self.entries.lock();
        guard.extend(entries);
        self.persist(&guard)
    }

    fn take_head(&self, n: usize) -> Result<Vec<QueueEntry>> {
        let mut guard = self.entries.lock();
        let count = n.min(guard.len());
        let taken: Vec<QueueEntry> = guard.drain(..count).collect();
        if !taken.is_empty() {
            self.persist(&guard)?;
        }
        Ok(taken)
    }

    fn push_front(&self, entries: Vec<QueueEntry>) -> Result<()> {
        let mut guard = self.entries.lock();
        for entry in entries.into_iter().rev() {
            guard.push_front(entry);
        }
        self.persist(&guard)
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn oldest_enqueued_at(&self) -> Option<i64> {
        self.entries.lock().front().map(|entry| entry.enqueued_at)
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.entries.lock();
        guard.clear();
        self.persist(&guard)
    }
}
