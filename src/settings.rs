//! Best-effort key-value settings store.
//!
//! The store persists JSON-serializable configuration (credentials, active
//! provider set, drafting preferences). It is an injected dependency, never
//! a singleton: components that need persistence hold an
//! `Arc<dyn SettingsStore>`.
//!
//! Persistence is best-effort by contract. A store that cannot reach its
//! backing file degrades to memory-only operation and reports failed
//! writes through the `set` return value; it never panics or raises.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, warn};

/// Key-value JSON settings store.
pub trait SettingsStore: Send + Sync {
    /// Read a value, or `None` when the key is absent or the store is
    /// unavailable.
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a value. Returns `false` when the value could not be
    /// persisted; callers must treat that as a warning, not a failure.
    fn set(&self, key: &str, value: Value) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and hosts that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemorySettings {
    map: RwLock<BTreeMap<String, Value>>,
}

impl MemorySettings {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> bool {
        let mut map = self.map.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_owned(), value);
        true
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Store backed by a single JSON object file.
///
/// The whole file is read once at open and rewritten on every `set`. When
/// the file is unreadable or unwritable the store keeps serving the
/// in-memory view and reports write failures via `set`'s return value.
pub struct FileSettings {
    path: PathBuf,
    cache: RwLock<BTreeMap<String, Value>>,
}

impl FileSettings {
    /// Open a store at `path`, loading any existing content.
    ///
    /// A missing file is an empty store. An unparsable file is treated as
    /// empty with a warning; the corrupt content is overwritten on the
    /// next `set`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, Value>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "settings file unparsable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings file unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    /// Open a store at the platform default location
    /// (`<config dir>/crossfeed/settings.json`), falling back to a path in
    /// the working directory when the platform dirs cannot be resolved.
    pub fn open_default() -> Self {
        Self::open(default_settings_path())
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, map: &BTreeMap<String, Value>) -> bool {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(path = %self.path.display(), error = %e, "cannot create settings directory");
                    return false;
                }
            }
        }
        let serialized = match serde_json::to_string_pretty(map) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "cannot serialize settings");
                return false;
            }
        };
        match std::fs::write(&self.path, serialized) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "settings write failed");
                false
            }
        }
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<Value> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> bool {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(key.to_owned(), value);
        // The in-memory view is updated even when the write fails, so the
        // session keeps working while the caller surfaces the warning.
        self.persist(&cache)
    }
}

/// Default settings file path under the platform config directory.
pub fn default_settings_path() -> PathBuf {
    match directories::ProjectDirs::from("", "", "crossfeed") {
        Some(dirs) => dirs.config_dir().join("settings.json"),
        None => {
            debug!("platform config dir unavailable, using working directory");
            PathBuf::from("crossfeed-settings.json")
        }
    }
}
