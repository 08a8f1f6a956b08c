//! Persisted storage capability for the local override list.
//!
//! A [`Store`] holds one JSON array of camera records under a single key.
//! Reads never fail: missing or corrupt data reads as an empty list.
//! Writes are best-effort: a failure is logged and swallowed so the
//! in-memory edit that triggered it still completes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use camwatch_core::camera::Camera;

/// Failures inside a store implementation. Never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Key-addressed camera list persistence.
#[async_trait]
pub trait Store: Send + Sync {
    /// Every persisted record, or `[]` when storage is missing or corrupt.
    async fn read_all(&self) -> Vec<Camera>;

    /// Replace the persisted list. Failures are logged, not returned.
    async fn write_all(&self, records: &[Camera]);
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Store backed by `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so readers see either the old list or the new one.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn try_read(&self) -> Result<Vec<Camera>, StoreError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn try_write(&self, records: &[Camera]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn read_all(&self) -> Vec<Camera> {
        match self.try_read().await {
            Ok(records) => records,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Override store unreadable, treating as empty",
                );
                Vec::new()
            }
        }
    }

    async fn write_all(&self, records: &[Camera]) {
        if let Err(e) = self.try_write(records).await {
            tracing::error!(
                path = %self.path.display(),
                count = records.len(),
                error = %e,
                "Failed to persist override store",
            );
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory [`Store`] holding the serialized list, for tests and
/// ephemeral sessions.
///
/// Records round-trip through JSON exactly like the file store, and writes
/// can be made to fail to exercise the swallow-and-log path.
#[derive(Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with `records`.
    pub fn with_records(records: &[Camera]) -> Self {
        let store = Self::new();
        if let Ok(raw) = serde_json::to_string(records) {
            store.set_raw(raw);
        }
        store
    }

    /// Replace the stored payload verbatim (e.g. with corrupt JSON).
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.raw.lock().unwrap_or_else(|e| e.into_inner()) = Some(raw.into());
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make subsequent writes fail (as a full quota would).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn try_write(&self, records: &[Camera]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("storage quota exceeded".to_string()));
        }
        let raw = serde_json::to_string(records)?;
        self.set_raw(raw);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read_all(&self) -> Vec<Camera> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let Some(raw) = self.raw() else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "In-memory override store corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    async fn write_all(&self, records: &[Camera]) {
        if let Err(e) = self.try_write(records) {
            tracing::error!(count = records.len(), error = %e, "Failed to persist override store");
        }
    }
}
