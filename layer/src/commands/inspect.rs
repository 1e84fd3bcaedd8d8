use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use liblayer::LayerReport;
use liblayer::error::Result;
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled)]
struct InspectRow {
    #[tabled(rename = "N")]
    index: usize,
    #[tabled(rename = "Layer")]
    diff_id: String,
    #[tabled(rename = "Size")]
    size: String,
}

/// Report wrapper that serializes exactly like the library report.
#[derive(Serialize)]
#[serde(transparent)]
pub struct InspectOutput(pub LayerReport);

impl Formattable for InspectOutput {
    fn format_pretty(&self) -> String {
        format::table(self.0.layers.iter().map(|row| InspectRow {
            index: row.index,
            diff_id: row.diff_id.to_string(),
            size: row.size_display.clone(),
        }))
    }
}

/// Handle the inspect command
pub async fn handle_inspect(ctx: &AppContext, reference: &str, fmt: OutputFormat) -> Result<()> {
    let inspector = ctx.inspector();

    let spinner = format::spinner(&format!("Resolving {}", reference), ctx.show_progress());
    let report = inspector.inspect(reference).await;
    spinner.finish_and_clear();

    let output = format::format_output(&InspectOutput(report?), fmt)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
