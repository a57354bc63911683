//! File-backed storage backend: one JSON file per key in a directory.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;

use super::{
    DEFAULT_EVENT_CAPACITY, Result, Storage, StorageChange, StorageError, StorageEvent, TabId,
};

/// Storage persisted under a directory so state survives restarts.
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// never observes a half-written value. Change events are delivered only to
/// subscribers in the same process.
#[derive(Clone)]
pub struct FileStorage {
    inner: Arc<FileStorageInner>,
}

struct FileStorageInner {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_capacity(dir, DEFAULT_EVENT_CAPACITY)
    }

    /// Like [`FileStorage::open`] with an explicit event channel capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_capacity(dir: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let (events, _) = broadcast::channel(capacity.max(1));
        tracing::debug!(dir = %dir.display(), "Opened file storage");
        Ok(Self {
            inner: Arc::new(FileStorageInner { dir, events }),
        })
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.inner.dir.join(format!("{}.json", encode_key(key)?)))
    }

    fn notify(&self, key: &str, change: StorageChange, origin: TabId) {
        let _ = self.inner.events.send(StorageEvent {
            key: key.to_owned(),
            change,
            origin,
        });
    }
}

/// Map a key to a file name: ASCII alphanumerics and `-_@` pass through,
/// everything else (including a leading dot) is percent-encoded.
fn encode_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_owned()));
    }
    let mut encoded = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_' | b'@')
            || (byte == b'.' && i > 0);
        if keep {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    Ok(encoded)
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str, origin: TabId) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("json.{origin}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        self.notify(key, StorageChange::Set, origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: TabId) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => {
                self.notify(key, StorageChange::Removed, origin);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }
}
