//! Durable per-user storage for the registered email.
//!
//! Only the email is stored, never the verdict: every session re-validates it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ignore_poison::IgnorePoison;

/// Preference key the email lives under.
pub const STORE_KEY_EMAIL: &str = "identity_check.email";

/// File name of the preferences file inside the app's config directory.
const STORE_FILE_NAME: &str = "identity.json";

/// Error types for preference storage.
#[derive(Debug)]
pub enum StoreError {
    /// The platform has no per-user config directory
    NoConfigDir,
    /// Reading or writing the preferences file failed
    Io(io::Error),
    /// The preferences file exists but isn't a JSON object
    Parse(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoConfigDir => write!(f, "no per-user config directory on this platform"),
            Self::Io(e) => write!(f, "preferences I/O error: {e}"),
            Self::Parse(msg) => write!(f, "preferences file is corrupt: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Durable home of the stored identity. The client is the only writer of its key.
pub trait IdentityStore: Send + Sync + 'static {
    /// Returns the stored email, `None` if nothing (or an empty string) is stored.
    fn load_email(&self) -> Result<Option<String>, StoreError>;
    fn save_email(&self, email: &str) -> Result<(), StoreError>;
    /// Removing an absent email is not an error.
    fn delete_email(&self) -> Result<(), StoreError>;
}

/// Keeps the email in process memory. For hosts without durable storage, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    email: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(email: &str) -> Self {
        Self {
            email: Mutex::new(Some(email.to_string())),
        }
    }
}

impl IdentityStore for MemoryStore {
    fn load_email(&self) -> Result<Option<String>, StoreError> {
        Ok(self.email.lock_ignore_poison().clone().filter(|e| !e.is_empty()))
    }

    fn save_email(&self, email: &str) -> Result<(), StoreError> {
        *self.email.lock_ignore_poison() = Some(email.to_string());
        Ok(())
    }

    fn delete_email(&self) -> Result<(), StoreError> {
        *self.email.lock_ignore_poison() = None;
        Ok(())
    }
}

/// Flat JSON preferences file (`{"identity_check.email": "..."}`), in the same shape the host
/// app's settings store uses. Keys written by others are preserved.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at `<per-user config dir>/<app_id>/identity.json`
    /// (like `~/.config/<app_id>/identity.json` on Linux).
    pub fn for_app(app_id: &str) -> Result<Self, StoreError> {
        let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(config_dir.join(app_id).join(STORE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(serde_json::Map::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }

        match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Parse("top-level value is not an object".to_string())),
            Err(e) => Err(StoreError::Parse(e.to_string())),
        }
    }

    fn write_object(&self, map: &serde_json::Map<String, serde_json::Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map).map_err(|e| StoreError::Parse(e.to_string()))?;

        // Write to a sibling temp file and rename so a crash never leaves a half-written file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl IdentityStore for FileStore {
    fn load_email(&self) -> Result<Option<String>, StoreError> {
        let map = self.read_object()?;
        Ok(map
            .get(STORE_KEY_EMAIL)
            .and_then(|v| v.as_str())
            .filter(|e| !e.is_empty())
            .map(str::to_string))
    }

    fn save_email(&self, email: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock_ignore_poison();
        let mut map = self.read_object()?;
        map.insert(STORE_KEY_EMAIL.to_string(), serde_json::json!(email));
        self.write_object(&map)
    }

    fn delete_email(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock_ignore_poison();
        let mut map = self.read_object()?;
        if map.remove(STORE_KEY_EMAIL).is_none() {
            return Ok(());
        }
        self.write_object(&map)
    }
}
