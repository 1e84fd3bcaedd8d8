use liblayer::Config;
use liblayer::error::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Get the config file path, respecting the LAYER_CONFIG environment variable
pub fn get_config_path() -> PathBuf {
    if let Ok(config_path) = env::var("LAYER_CONFIG") {
        return PathBuf::from(config_path);
    }

    // Default to ~/.config/layer/config.yaml
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("layer").join("config.yaml")
    } else {
        PathBuf::from("config.yaml")
    }
}

/// Load the config file at `path`, falling back to defaults when it does
/// not exist.
///
/// A file that exists but cannot be parsed is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "loading config file");
        Config::load(Some(path))
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Config::load(None)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
