//! Library configuration.
//!
//! Configuration starts from defaults and is merged with an optional YAML or
//! TOML file. The CLI layers environment variables and flags on top before
//! handing the result to [`crate::InspectorBuilder`].

use crate::error::{LayerError, Result};
use crate::oci::TargetPlatform;
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub platform: TargetPlatform,
    #[serde(default)]
    pub daemon: Daemon,
    #[serde(default)]
    pub registries: Registries,
    #[serde(default)]
    pub auth: Auth,
}

impl Config {
    /// Parses a `Config` from a YAML string, on top of the defaults.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// The file format is picked from the extension (`.yaml`, `.yml`,
    /// `.toml`). With `None`, the defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).required(true));
        }

        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                LayerError::config_with_source(
                    "Failed to deserialize configuration",
                    None,
                    e,
                )
            })
    }
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

/// Local image daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Daemon {
    /// Whether references are looked up in the local daemon at all
    #[serde(default = "default_daemon_enabled")]
    pub enabled: bool,

    /// CLI used to export images (`docker`, `podman`)
    #[serde(default = "default_daemon_command")]
    pub command: String,
}

impl Default for Daemon {
    fn default() -> Self {
        Self {
            enabled: default_daemon_enabled(),
            command: default_daemon_command(),
        }
    }
}

fn default_daemon_enabled() -> bool {
    true
}

fn default_daemon_command() -> String {
    "docker".to_string()
}

/// Registry access settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Registries {
    /// Hosts contacted over plain HTTP
    #[serde(default)]
    pub insecure: Vec<String>,
}

impl Registries {
    /// Returns true if `host` should be contacted over plain HTTP.
    ///
    /// Loopback registries are always treated as insecure.
    pub fn is_insecure(&self, host: &str) -> bool {
        let bare = host.split(':').next().unwrap_or(host);
        bare == "localhost" || bare == "127.0.0.1" || self.insecure.iter().any(|h| h == host)
    }
}

/// Credential lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Auth {
    /// Docker `config.json` to read instead of the default location
    #[serde(default)]
    pub docker_config: Option<String>,
}
