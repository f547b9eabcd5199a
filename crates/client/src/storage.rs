//! Persistent key/value storage.
//!
//! Values are JSON files in the platform-appropriate config directory:
//!   - Linux: `~/.config/coursehub/`
//!   - macOS: `~/Library/Application Support/coursehub/`
//!   - Windows: `%APPDATA%\coursehub\`

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the user's config directory, if the platform has one.
    pub fn default_location() -> Option<Self> {
        Some(Self::new(dirs::config_dir()?.join("coursehub")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be a valid filename
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Returns `true` if the value was written.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                crate::log_warn!("storage: failed to serialize {}: {}", key, e);
                return false;
            }
        };
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            crate::log_warn!("storage: cannot create {}: {}", self.dir.display(), e);
            return false;
        }
        match std::fs::write(self.file_path(key), json) {
            Ok(()) => true,
            Err(e) => {
                crate::log_warn!("storage: failed to write {}: {}", key, e);
                false
            }
        }
    }

    /// `None` if the key is missing or the stored JSON no longer parses.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = std::fs::read_to_string(self.file_path(key)).ok()?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                crate::log_warn!("storage: discarding unreadable {}: {}", key, e);
                None
            }
        }
    }

    pub fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.file_path(key));
    }

    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }
}
