//! Credential lookup for registry hosts.
//!
//! A [`Keychain`] is passed explicitly to the registry resolver instead of
//! being consulted as process-wide state. The default implementation reads
//! the `auths` section of a docker `config.json`.

use super::Credentials;
use crate::error::{LayerError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(test)]
#[path = "keychain_tests.rs"]
mod tests;

/// Source of credentials for registry hosts.
pub trait Keychain: Send + Sync {
    /// Returns the credentials stored for `registry`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store exists but cannot be read.
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>>;
}

/// Keychain that never has credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousKeychain;

impl Keychain for AnonymousKeychain {
    fn resolve(&self, _registry: &str) -> Result<Option<Credentials>> {
        Ok(None)
    }
}

/// Names under which Docker Hub credentials are stored by `docker login`.
const DOCKER_HUB_ALIASES: &[&str] = &[
    "docker.io",
    "index.docker.io",
    "registry-1.docker.io",
    "registry.hub.docker.com",
];

#[derive(Debug, Default, Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, DockerAuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerAuthEntry {
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Keychain backed by a docker `config.json`.
///
/// # Examples
///
/// ```no_run
/// use liblayer::auth::{DockerConfigKeychain, Keychain};
///
/// # fn example() -> liblayer::error::Result<()> {
/// let keychain = DockerConfigKeychain::from_default_location();
/// let creds = keychain.resolve("ghcr.io")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DockerConfigKeychain {
    /// Path to `config.json`; `None` when no location could be determined
    path: Option<PathBuf>,
}

impl DockerConfigKeychain {
    /// Creates a keychain reading the given `config.json`.
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Creates a keychain at `$DOCKER_CONFIG/config.json`, else
    /// `~/.docker/config.json`.
    pub fn from_default_location() -> Self {
        let path = match std::env::var_os("DOCKER_CONFIG") {
            Some(dir) => Some(PathBuf::from(dir).join("config.json")),
            None => dirs::home_dir().map(|home| home.join(".docker").join("config.json")),
        };
        Self { path }
    }

    /// Returns the config file this keychain reads.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load(path: &Path) -> Result<DockerConfigFile> {
        let contents = fs::read_to_string(path).map_err(|e| {
            LayerError::config_with_source(
                "Failed to read docker config",
                path.to_str(),
                e,
            )
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            LayerError::config_with_source("Failed to parse docker config", path.to_str(), e)
        })
    }

    fn decode_entry(entry: &DockerAuthEntry) -> Result<Option<Credentials>> {
        if let Some(auth) = entry.auth.as_deref().filter(|a| !a.is_empty()) {
            use base64::{Engine as _, engine::general_purpose};
            let decoded = general_purpose::STANDARD
                .decode(auth)
                .map_err(|e| LayerError::validation_with_source("Failed to decode auth entry", e))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|e| LayerError::validation_with_source("Invalid auth entry encoding", e))?;
            let (username, password) = decoded.split_once(':').ok_or_else(|| {
                LayerError::validation("Auth entry is not in user:password form")
            })?;
            return Ok(Some(Credentials::basic(username, password)));
        }
        match (&entry.username, &entry.password) {
            (Some(username), Some(password)) => Ok(Some(Credentials::basic(username, password))),
            _ => Ok(None),
        }
    }
}

/// Reduces a config key such as `https://index.docker.io/v1/` to its host.
fn normalize_host(key: &str) -> &str {
    let key = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    key.split('/').next().unwrap_or(key)
}

impl Keychain for DockerConfigKeychain {
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let config = Self::load(path)?;

        let wanted: Vec<&str> = if DOCKER_HUB_ALIASES.contains(&registry) {
            DOCKER_HUB_ALIASES.to_vec()
        } else {
            vec![registry]
        };

        for (key, entry) in &config.auths {
            if wanted.contains(&normalize_host(key)) {
                tracing::debug!(registry, key = key.as_str(), "using credentials from docker config");
                return Self::decode_entry(entry);
            }
        }
        Ok(None)
    }
}
