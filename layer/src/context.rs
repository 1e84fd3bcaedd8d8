//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::config;
use liblayer::error::Result;
use liblayer::oci::TargetPlatform;
use liblayer::{Config, Inspector};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// How much the CLI logs to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Quiet,
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return VerbosityLevel::Quiet;
        }
        match verbose {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Default `tracing` filter directive for this level.
    pub fn log_level(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::Debug => "debug",
            VerbosityLevel::Trace => "trace",
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(platform_flag: Option<&str>, verbosity: VerbosityLevel) -> Result<Self> {
        // 1 + 2. Defaults merged with the config file, if there is one
        let config = config::load_config(&config::get_config_path())?;

        // 3 + 4. Environment, then flags
        let config = apply_overrides(config, |key| env::var(key).ok(), platform_flag)?;

        Ok(Self { config, verbosity })
    }

    /// Creates the inspector every command runs against.
    pub fn inspector(&self) -> Inspector {
        Inspector::builder().config(self.config.clone()).build()
    }

    /// Whether progress indicators may be drawn.
    pub fn show_progress(&self) -> bool {
        self.verbosity != VerbosityLevel::Quiet
    }
}

/// Applies environment variables (read through `lookup`) and then the
/// `--platform` flag on top of `config`.
pub(crate) fn apply_overrides<F>(
    mut config: Config,
    lookup: F,
    platform_flag: Option<&str>,
) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(platform) = lookup("LAYER_PLATFORM") {
        config.platform = TargetPlatform::from_str(&platform)?;
    }
    if let Some(command) = lookup("LAYER_DAEMON_COMMAND") {
        config.daemon.command = command;
    }
    if let Some(dir) = lookup("DOCKER_CONFIG") {
        let path = Path::new(&dir).join("config.json");
        config.auth.docker_config = Some(path.to_string_lossy().into_owned());
    }

    if let Some(platform) = platform_flag {
        config.platform = TargetPlatform::from_str(platform)?;
    }

    Ok(config)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
