use indicatif::{ProgressBar, ProgressStyle};
use liblayer::LayerError;
use liblayer::error::Result;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::time::Duration;
use tabled::settings::{Padding, Style};
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables
    Pretty,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Pretty,
        }
    }
}

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self) -> String;
}

/// Format a single item for output
pub fn format_output<T: Formattable>(item: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Pretty => Ok(item.format_pretty()),
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .map_err(|e| LayerError::validation_with_source("Failed to serialize to JSON", e)),
        OutputFormat::Yaml => serde_yaml::to_string(item)
            .map_err(|e| LayerError::validation_with_source("Failed to serialize to YAML", e)),
    }
}

/// Renders rows as a borderless table with two spaces between columns.
pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    let rendered = Table::new(rows)
        .with(Style::empty())
        .with(Padding::new(0, 2, 0, 0))
        .to_string();

    rendered
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Spinner on stderr while `message` is in progress.
///
/// Hidden when stderr is not a terminal or progress is switched off.
pub fn spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
