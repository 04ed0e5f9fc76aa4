//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, storage, access and media sections. Every section defaults
//! sensibly so a completely empty `{}` file is valid. Environment variables
//! are applied on top of the file via [`Config::apply_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Environment variable overriding [`ServerConfig::host`].
pub const ENV_HOST: &str = "KEEPSAKE_HOST";
/// Environment variable overriding [`ServerConfig::port`].
pub const ENV_PORT: &str = "KEEPSAKE_PORT";
/// Environment variable overriding [`StorageConfig::upload_dir`].
pub const ENV_UPLOAD_DIR: &str = "UPLOAD_DIR";
/// Environment variable overriding [`AccessConfig::event_token`].
pub const ENV_EVENT_TOKEN: &str = "EVENT_TOKEN";

/// Tokens shorter than this trigger a validation warning.
const MIN_EVENT_TOKEN_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub access: AccessConfig,
    pub media: MediaConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| Error::Config(format!("parse error: {e}")))
    }

    /// Load configuration from a file path. Unlike [`Config::load_or_default`],
    /// a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Empty values are ignored, except for [`ENV_EVENT_TOKEN`] where an empty
    /// string explicitly disables the gate.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT).filter(|v| !v.is_empty()) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid {ENV_PORT}={port}"),
            }
        }
        if let Some(dir) = lookup(ENV_UPLOAD_DIR).filter(|v| !v.is_empty()) {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(token) = lookup(ENV_EVENT_TOKEN) {
            self.access.event_token = Some(token).filter(|t| !t.is_empty());
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if let Some(ref token) = self.access.event_token {
            if token.len() < MIN_EVENT_TOKEN_LEN {
                warnings.push(format!(
                    "access.event_token is shorter than {MIN_EVENT_TOKEN_LEN} characters"
                ));
            }
        }

        if let Some(ref dir) = self.server.static_dir {
            if !dir.is_dir() {
                warnings.push(format!(
                    "server.static_dir {} does not exist; UI will not be served",
                    dir.display()
                ));
            }
        }

        if !self.storage.upload_dir.is_dir() {
            warnings.push(format!(
                "storage.upload_dir {} does not exist",
                self.storage.upload_dir.display()
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            static_dir: None,
        }
    }
}

/// Where uploaded media lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
        }
    }
}

/// Event-token access gate. `None` leaves the gallery open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub event_token: Option<String>,
}

/// Media serving behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Sniff leading bytes and refuse files whose content contradicts their
    /// extension.
    pub verify_signatures: bool,
}
