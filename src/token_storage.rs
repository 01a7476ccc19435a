use crate::config::{StorageBackend, StorageConfig};
use crate::errors::SessionError;
use crate::traits::SessionStorage;
use keyring::Entry;

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const KEYRING_SERVICE: &str = "eatlog";
/// Fixed key the session is stored under
pub const SESSION_KEY: &str = "session";
const SESSION_FILE_NAME: &str = "session.json";

/// Session storage backed by the OS keyring, falling back to a JSON file
/// when the keyring is unavailable.
#[derive(Debug)]
pub struct TokenStorage {
    pub keyring_entry: Option<Arc<Entry>>,
    pub session_file_path: PathBuf,
}

impl TokenStorage {
    pub fn new(file_path: Option<PathBuf>) -> Result<Self, SessionError> {
        let keyring_entry = match Entry::new(KEYRING_SERVICE, SESSION_KEY) {
            Ok(entry) => Some(Arc::new(entry)),
            Err(e) => {
                tracing::warn!(
                    "Keyring is not available on this system ({}), will use file-based storage.",
                    e
                );
                None
            }
        };

        Self::with_entry(keyring_entry, file_path.unwrap_or_else(default_session_file_path))
    }

    /// Keyring storage using the given entry, with `file_path` as fallback
    pub fn with_keyring(entry: Entry, file_path: PathBuf) -> Result<Self, SessionError> {
        Self::with_entry(Some(Arc::new(entry)), file_path)
    }

    /// File storage only, the keyring is never touched
    pub fn file_only(file_path: PathBuf) -> Result<Self, SessionError> {
        Self::with_entry(None, file_path)
    }

    fn with_entry(
        keyring_entry: Option<Arc<Entry>>,
        session_file_path: PathBuf,
    ) -> Result<Self, SessionError> {
        if let Some(parent) = session_file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(TokenStorage {
            keyring_entry,
            session_file_path,
        })
    }

    fn read_keyring(&self, entry: &Entry) -> Result<Option<String>, SessionError> {
        match entry.get_password() {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            Ok(_) => Ok(None),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_file(&self) -> Result<Option<String>, SessionError> {
        if !self.session_file_path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&self.session_file_path)?;
        if value.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(value))
    }

    fn write_file(&self, value: &str) -> Result<(), SessionError> {
        fs::write(&self.session_file_path, value)?;
        tracing::debug!("Session saved to file: {:?}", self.session_file_path);
        Ok(())
    }

    fn remove_file(&self) -> Result<(), SessionError> {
        if self.session_file_path.exists() {
            fs::remove_file(&self.session_file_path)?;
            tracing::debug!("Session file deleted: {:?}", self.session_file_path);
        }
        Ok(())
    }
}

impl SessionStorage for TokenStorage {
    fn read(&self) -> Result<Option<String>, SessionError> {
        if let Some(ref entry) = self.keyring_entry {
            match self.read_keyring(entry) {
                Ok(Some(value)) => {
                    tracing::debug!("Session loaded from keyring");
                    return Ok(Some(value));
                }
                Ok(None) => {
                    tracing::debug!("No session found in keyring, checking file storage");
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load session from keyring: {}. Checking file storage.",
                        e
                    );
                }
            }
        }

        let value = self.read_file()?;
        if let (Some(entry), Some(value)) = (&self.keyring_entry, &value) {
            // Move a file-stored session into the keyring
            match entry.set_password(value) {
                Ok(()) => {
                    if let Err(e) = self.remove_file() {
                        tracing::warn!("Failed to remove migrated session file: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Failed to migrate session to keyring: {}", e),
            }
        }
        Ok(value)
    }

    fn write(&self, value: &str) -> Result<(), SessionError> {
        if let Some(ref entry) = self.keyring_entry {
            match entry.set_password(value) {
                Ok(()) => {
                    tracing::debug!("Session saved to keyring");
                    // A leftover file would shadow a later keyring failure
                    if let Err(e) = self.remove_file() {
                        tracing::warn!("Failed to remove stale session file: {}", e);
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to save session to keyring: {}. Trying fallback storage.",
                        e
                    );
                }
            }
        }

        self.write_file(value)
    }

    fn remove(&self) -> Result<(), SessionError> {
        let keyring_result = match self.keyring_entry {
            Some(ref entry) => match entry.delete_password() {
                Ok(()) => {
                    tracing::debug!("Session deleted from keyring");
                    Ok(())
                }
                Err(keyring::Error::NoEntry) => {
                    tracing::debug!("No session entry found in keyring to delete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Failed to delete session from keyring: {}", e);
                    Err(SessionError::from(e))
                }
            },
            None => Ok(()),
        };

        // The file is removed even when the keyring still holds the session
        self.remove_file()?;
        keyring_result
    }
}

/// In-process storage; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a raw value
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, SessionError> {
        Ok(self.slot().clone())
    }

    fn write(&self, value: &str) -> Result<(), SessionError> {
        *self.slot() = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}

pub fn default_session_file_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("eatlog");
    path.push(SESSION_FILE_NAME);
    path
}

/// Build the storage backend selected in the config
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn SessionStorage>, SessionError> {
    let file_path = config.file_path.as_ref().map(PathBuf::from);

    let storage: Arc<dyn SessionStorage> = match config.backend {
        StorageBackend::Keyring => Arc::new(TokenStorage::new(file_path)?),
        StorageBackend::File => Arc::new(TokenStorage::file_only(
            file_path.unwrap_or_else(default_session_file_path),
        )?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };

    tracing::debug!("Using {:?} session storage", config.backend);
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let storage = TokenStorage::file_only(path.clone()).unwrap();

        assert_eq!(storage.read().unwrap(), None);

        storage.write(r#"{"identity":"alice"}"#).unwrap();
        assert!(path.exists());
        assert_eq!(
            storage.read().unwrap().as_deref(),
            Some(r#"{"identity":"alice"}"#)
        );

        storage.remove().unwrap();
        assert!(!path.exists());
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn test_file_storage_remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        let storage = TokenStorage::file_only(dir.path().join("session.json")).unwrap();

        assert!(storage.remove().is_ok());
        assert!(storage.remove().is_ok());
    }

    #[test]
    fn test_file_storage_blank_file_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "   \n").unwrap();

        let storage = TokenStorage::file_only(path).unwrap();
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::with_value("stored");
        assert_eq!(storage.read().unwrap().as_deref(), Some("stored"));

        storage.write("replaced").unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some("replaced"));

        storage.remove().unwrap();
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn test_open_file_backend() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let config = StorageConfig {
            backend: StorageBackend::File,
            file_path: Some(path.to_string_lossy().into_owned()),
        };

        let storage = open_storage(&config).unwrap();
        storage.write("value").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            file_path: None,
        };

        let storage = open_storage(&config).unwrap();
        assert_eq!(storage.read().unwrap(), None);
    }
}
