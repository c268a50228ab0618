//! Client Storage Module
//!
//! Persistence for the client cache. The whole cache is one slot: every save
//! overwrites it completely.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use crate::error::{RelayError, Result};

// == Cached Message ==
/// A message as persisted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMessage {
    pub id: String,
    pub message: String,
    /// When the client received it (Unix milliseconds)
    pub timestamp: u64,
}

impl CachedMessage {
    pub fn new(id: impl Into<String>, message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            timestamp,
        }
    }
}

/// Full cache contents keyed by message id.
pub type CacheSnapshot = BTreeMap<String, CachedMessage>;

// == Cache Storage ==
/// Get/set/subscribe access to the persisted cache slot.
pub trait CacheStorage: Send + Sync {
    /// Reads the whole slot. An absent slot is an empty cache.
    fn load(&self) -> Result<CacheSnapshot>;

    /// Replaces the whole slot.
    fn save(&self, snapshot: &CacheSnapshot) -> Result<()>;

    /// Watches the slot revision, bumped after every save.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

fn bump(revision: &watch::Sender<u64>) {
    revision.send_modify(|rev| *rev += 1);
}

// == Memory Storage ==
/// Storage kept in memory, used by tests and short-lived clients.
#[derive(Debug)]
pub struct MemoryStorage {
    slot: Mutex<CacheSnapshot>,
    revision: watch::Sender<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_snapshot(CacheSnapshot::new())
    }

    /// Starts with `snapshot` already persisted.
    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            slot: Mutex::new(snapshot),
            revision,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStorage for MemoryStorage {
    fn load(&self) -> Result<CacheSnapshot> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| RelayError::Storage("memory slot poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        {
            let mut slot = self
                .slot
                .lock()
                .map_err(|_| RelayError::Storage("memory slot poisoned".to_string()))?;
            *slot = snapshot.clone();
        }
        bump(&self.revision);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

// == File Storage ==
/// Storage in a single JSON file, rewritten through a temp file and rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    revision: watch::Sender<u64>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            path: path.into(),
            revision,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique per process and per save, so concurrent writers never share
    /// a temp file.
    fn temp_path(&self) -> PathBuf {
        static NEXT_TEMP: AtomicU64 = AtomicU64::new(0);

        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache".into());
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            NEXT_TEMP.fetch_add(1, Ordering::Relaxed)
        ));
        self.path.with_file_name(name)
    }
}

impl CacheStorage for FileStorage {
    fn load(&self) -> Result<CacheSnapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheSnapshot::new())
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                warn!(
                    "Failed to parse cache file {}: {}; starting empty",
                    self.path.display(),
                    err
                );
                Ok(CacheSnapshot::new())
            }
        }
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let temp = self.temp_path();
        if let Err(err) = fs::write(&temp, json).and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }

        bump(&self.revision);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
