//! Key/value storage capability backing the token store.
//!
//! The session layer never checks what kind of environment it runs in. Instead a
//! `StorageBackend` is chosen once at startup: persistent storage for an interactive
//! client, a no-op backend where nothing may be persisted (headless or server-side
//! rendering contexts), or process-local memory.
//!
//! Backends are infallible from the caller's point of view. I/O problems are logged and
//! read as "absent", so storage can never turn into a failure of the session lifecycle.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, warn};

/// String key/value storage, in the manner of browser local storage.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// Where the client is running, which decides how (and whether) state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A user-facing client; tokens survive restarts.
    Interactive,
    /// No persistent storage is available; every operation is a no-op.
    Headless,
    /// Tokens live only as long as the process.
    Memory,
}

impl FromStr for ExecutionContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" => Ok(ExecutionContext::Interactive),
            "headless" => Ok(ExecutionContext::Headless),
            "memory" => Ok(ExecutionContext::Memory),
            other => Err(format!("unknown execution context: {}", other)),
        }
    }
}

/// Selects the storage backend for an execution context.
pub fn for_context(context: ExecutionContext, path: &Path) -> Arc<dyn StorageBackend> {
    debug!("Selecting {:?} storage", context);
    match context {
        ExecutionContext::Interactive => Arc::new(FileStorage::new(path)),
        ExecutionContext::Headless => Arc::new(NoopStorage),
        ExecutionContext::Memory => Arc::new(MemoryStorage::default()),
    }
}

/// Storage that persists nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorage;

impl StorageBackend for NoopStorage {
    fn get_item(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_item(&self, _key: &str, _value: &str) {}

    fn remove_item(&self, _key: &str) {}
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.items.read() {
            Ok(items) => items.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set_item(&self, key: &str, value: &str) {
        let mut items = self.items.write().unwrap_or_else(|p| p.into_inner());
        items.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        let mut items = self.items.write().unwrap_or_else(|p| p.into_inner());
        items.remove(key);
    }
}

/// Storage kept in a JSON object on disk.
///
/// Every read goes back to the file, so a write is visible to the next read even across
/// separate `FileStorage` instances pointing at the same path. Writes are serialized
/// within the process by a lock around the read-modify-write cycle.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed storage file {}: {}", self.path.display(), e);
            HashMap::new()
        })
    }

    fn save(&self, items: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create {}: {}", parent.display(), e);
                return;
            }
        }
        let staging = self.path.with_extension("tmp");
        let result = serde_json::to_string_pretty(items)
            .map_err(io::Error::from)
            .and_then(|body| write_private(&staging, body.as_bytes()))
            .and_then(|()| fs::rename(&staging, &self.path));
        if let Err(e) = result {
            warn!("Failed to write {}: {}", self.path.display(), e);
            let _ = fs::remove_file(&staging);
        }
    }

    fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut items = self.load();
        if change(&mut items) {
            self.save(&items);
        }
    }
}

/// Writes `body` to `path`, readable by the owner only. The tokens it holds are bearer
/// credentials.
fn write_private(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(body)?;
    file.sync_all()?;

    // `mode` only applies on creation; tighten a leftover file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        });
    }

    fn remove_item(&self, key: &str) {
        // Removing from an absent file must not create one.
        self.update(|items| items.remove(key).is_some());
    }
}
