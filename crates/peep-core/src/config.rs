//! Configuration management for Peep.
//!
//! Loads configuration from ${PEEP_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// OAuth client registration for the Google project backing this app.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// OAuth client ID from the Google Cloud console.
    pub client_id: String,
    /// OAuth client secret paired with the client ID.
    pub client_secret: String,
}

/// Endpoint base URLs. Defaults point at Google; tests override these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Authorization endpoint (browser consent screen).
    pub authorize_url: String,
    /// Token exchange endpoint.
    pub token_url: String,
    /// Token revocation endpoint.
    pub revoke_url: String,
    /// People API base URL (no trailing slash).
    pub people_base_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            revoke_url: "https://oauth2.googleapis.com/revoke".to_string(),
            people_base_url: "https://people.googleapis.com".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth client registration.
    pub oauth: OAuthConfig,

    /// Endpoint base URLs.
    pub endpoints: EndpointsConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config template if no config exists yet.
    ///
    /// Returns true if a new file was created.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn init_default() -> Result<bool> {
        Self::init_default_at(&paths::config_path())
    }

    /// Writes the default template to a specific path unless it exists.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn init_default_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }

    /// Checks that an OAuth client is configured.
    ///
    /// # Errors
    /// Returns an error naming the config path when the client id or secret
    /// is missing.
    pub fn ensure_oauth_configured(&self) -> Result<()> {
        if self.oauth.client_id.is_empty() || self.oauth.client_secret.is_empty() {
            anyhow::bail!(
                "OAuth client not configured. Set [oauth] client_id and client_secret in {}",
                paths::config_path().display()
            );
        }
        Ok(())
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for Peep configuration and data directories.
    //!
    //! PEEP_HOME resolution order:
    //! 1. PEEP_HOME environment variable (if set)
    //! 2. ~/.config/peep (default)

    use std::path::PathBuf;

    /// Returns the Peep home directory.
    ///
    /// Checks PEEP_HOME env var first, falls back to ~/.config/peep
    pub fn peep_home() -> PathBuf {
        if let Ok(home) = std::env::var("PEEP_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("peep"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        peep_home().join("config.toml")
    }

    /// Returns the path to the cached session file.
    pub fn session_path() -> PathBuf {
        peep_home().join("session.json")
    }

    /// Returns the directory for diagnostic log files.
    pub fn logs_dir() -> PathBuf {
        peep_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: missing file loads defaults with Google endpoints.
    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.oauth.client_id.is_empty());
        assert_eq!(
            config.endpoints.token_url,
            "https://oauth2.googleapis.com/token"
        );
        assert_eq!(
            config.endpoints.people_base_url,
            "https://people.googleapis.com"
        );
    }

    /// Test: partial config keeps defaults for unspecified sections.
    #[test]
    fn test_partial_config_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[oauth]\nclient_id = \"cid\"\nclient_secret = \"secret\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.oauth.client_id, "cid");
        assert_eq!(
            config.endpoints.authorize_url,
            "https://accounts.google.com/o/oauth2/v2/auth"
        );
    }

    /// Test: default template parses and init refuses to overwrite.
    #[test]
    fn test_init_default_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(Config::init_default_at(&path).unwrap());
        let config = Config::load_from(&path).unwrap();
        assert!(config.oauth.client_id.is_empty());

        // Second init is a no-op.
        assert!(!Config::init_default_at(&path).unwrap());
    }

    /// Test: unconfigured OAuth client is rejected with a useful message.
    #[test]
    fn test_ensure_oauth_configured() {
        let mut config = Config::default();
        assert!(config.ensure_oauth_configured().is_err());

        config.oauth.client_id = "cid".to_string();
        config.oauth.client_secret = "secret".to_string();
        assert!(config.ensure_oauth_configured().is_ok());
    }
}
