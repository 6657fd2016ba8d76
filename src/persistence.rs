//! Durable key-value storage for player progress
//!
//! Values are flat JSON objects stored under opaque, feature-namespaced keys
//! (relationship scores, quest progress, inventory snapshots). There is no
//! schema versioning: compatibility is the caller's concern.
//!
//! The simulation talks to storage through `PersistenceAdapter`, which never
//! lets an I/O failure escape into a tick. Failed writes are logged and kept
//! pending, then retried the next time anything is saved.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde_json::Value;

use crate::core::error::{Result, WorldError};

/// Well-known keys
pub mod keys {
    pub const NPC_RELATIONSHIPS: &str = "world.npc_relationships";
    pub const QUEST_PROGRESS: &str = "world.quest_progress";
    pub const INVENTORY_SNAPSHOT: &str = "world.inventory";
}

/// Backing store contract
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&mut self, key: &str, value: &Value) -> Result<()>;
}

/// Volatile store, handy for tests and for running without disk access
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: AHashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WorldError::IoError(e)),
        }
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path_for(key), content)?;
        Ok(())
    }
}

/// Fire-and-forget front for a `KeyValueStore`
pub struct PersistenceAdapter {
    store: Box<dyn KeyValueStore>,
    pending: AHashMap<String, Value>,
}

impl PersistenceAdapter {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            pending: AHashMap::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Read a value. Failures are logged and read as "nothing stored".
    ///
    /// A value still waiting to be written wins over the store's copy.
    pub fn load(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.pending.get(key) {
            return Some(value.clone());
        }
        match self.store.load(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to load '{}': {}", key, e);
                None
            }
        }
    }

    /// Queue a write and flush everything pending.
    ///
    /// Returns true if every pending write reached the store.
    pub fn save(&mut self, key: &str, value: Value) -> bool {
        self.pending.insert(key.to_string(), value);
        self.flush()
    }

    /// Retry every pending write
    pub fn flush(&mut self) -> bool {
        let mut keys: Vec<String> = self.pending.keys().cloned().collect();
        keys.sort();

        let mut all_ok = true;
        for key in keys {
            let Some(value) = self.pending.get(&key) else {
                continue;
            };
            match self.store.save(&key, value) {
                Ok(()) => {
                    self.pending.remove(&key);
                }
                Err(e) => {
                    tracing::warn!("Failed to save '{}', will retry: {}", key, e);
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Number of writes waiting for a retry
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }
}

impl Default for PersistenceAdapter {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Store that fails while the shared switch is on
    pub struct FlakyStore {
        pub inner: MemoryStore,
        pub failing: Rc<Cell<bool>>,
    }

    impl FlakyStore {
        pub fn new() -> (Self, Rc<Cell<bool>>) {
            let failing = Rc::new(Cell::new(false));
            (
                Self {
                    inner: MemoryStore::new(),
                    failing: failing.clone(),
                },
                failing,
            )
        }
    }

    impl KeyValueStore for FlakyStore {
        fn load(&self, key: &str) -> Result<Option<Value>> {
            if self.failing.get() {
                return Err(WorldError::Persistence("store offline".into()));
            }
            self.inner.load(key)
        }

        fn save(&mut self, key: &str, value: &Value) -> Result<()> {
            if self.failing.get() {
                return Err(WorldError::Persistence("store offline".into()));
            }
            self.inner.save(key, value)
        }
    }
}
