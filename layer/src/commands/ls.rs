use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use liblayer::LayerListing;
use liblayer::error::Result;
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct LsOutput(pub Vec<LayerListing>);

impl Formattable for LsOutput {
    fn format_pretty(&self) -> String {
        let mut output = String::new();
        for listing in &self.0 {
            output.push('\n');
            output.push_str(&format!("--- {} ---\n", listing.diff_id));
            output.push_str(&format::table(listing.entries.iter().map(|entry| {
                FileRow {
                    mode: entry.mode_string(),
                    size: entry.size_display(),
                    name: entry.name.clone(),
                }
            })));
            output.push('\n');
        }
        output
    }
}

/// Handle the ls command
///
/// With no `layers` every layer is listed.
pub async fn handle_ls(
    ctx: &AppContext,
    reference: &str,
    layers: &[String],
    sort: bool,
    fmt: OutputFormat,
) -> Result<()> {
    let inspector = ctx.inspector();

    let spinner = format::spinner(&format!("Reading layers of {}", reference), ctx.show_progress());
    let listings = inspector.list(reference, layers, sort).await;
    spinner.finish_and_clear();

    let output = format::format_output(&LsOutput(listings?), fmt)?;
    match fmt {
        OutputFormat::Pretty => print!("{}", output),
        _ => println!("{}", output),
    }
    Ok(())
}

#[cfg(test)]
#[path = "ls_tests.rs"]
mod tests;
