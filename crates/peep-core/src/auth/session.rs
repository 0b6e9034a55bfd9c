//! Signed-in session storage.
//!
//! Stores the signed-in account identity in `${PEEP_HOME}/session.json` with
//! restricted permissions (0600). Tokens are never written here; signed-in
//! state across restarts means identity only, and a fresh credential is
//! minted per fetch.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// A signed-in Google account, as much of it as we retain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Primary email address.
    pub email: String,
    /// Display name, when the provider returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// On-disk session cache.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionCache {
    /// The signed-in account, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
}

impl SessionCache {
    /// Returns the path to the session cache file.
    pub fn cache_path() -> PathBuf {
        paths::session_path()
    }

    /// Loads the session cache from disk.
    /// Returns an empty cache if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::cache_path())
    }

    /// Loads the session cache from a specific path.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session cache from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session cache from {}", path.display()))
    }

    /// Saves the session cache to disk with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::cache_path())
    }

    /// Saves the session cache to a specific path.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize session cache")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    /// True when an account is cached.
    pub fn is_signed_in(&self) -> bool {
        self.account.is_some()
    }

    /// Records a signed-in account.
    pub fn set_account(&mut self, account: Account) {
        self.account = Some(account);
    }

    /// Clears the signed-in account, returning the previous one.
    pub fn clear(&mut self) -> Option<Account> {
        self.account.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: load/save roundtrip keeps the account.
    #[test]
    fn test_session_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut cache = SessionCache::default();
        assert!(!cache.is_signed_in());
        cache.set_account(Account {
            email: "user@example.com".to_string(),
            display_name: Some("User".to_string()),
        });
        cache.save_to(&path).unwrap();

        let loaded = SessionCache::load_from(&path).unwrap();
        assert!(loaded.is_signed_in());
        assert_eq!(loaded.account.unwrap().email, "user@example.com");
    }

    /// Test: missing file loads as signed out.
    #[test]
    fn test_session_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::load_from(&dir.path().join("session.json")).unwrap();
        assert!(!cache.is_signed_in());
    }

    /// Test: clear removes the account and returns it.
    #[test]
    fn test_session_clear() {
        let mut cache = SessionCache::default();
        cache.set_account(Account {
            email: "user@example.com".to_string(),
            display_name: None,
        });

        let removed = cache.clear();
        assert_eq!(removed.unwrap().email, "user@example.com");
        assert!(!cache.is_signed_in());
    }

    /// Test: the cache file is written with owner-only permissions.
    #[cfg(unix)]
    #[test]
    fn test_session_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        SessionCache::default().save_to(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
