//! Basic usage example for the liblayer library.
//!
//! Resolves an image, prints one row per layer, then lists the largest
//! files of the top layer.
//!
//! Run with: cargo run --example basic_usage -- alpine:latest

use liblayer::Inspector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let reference = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "alpine:latest".to_string());

    let inspector = Inspector::new();
    println!("Resolvers: {}\n", inspector.resolvers().join(" -> "));

    let report = inspector.inspect(&reference).await?;
    println!("{}", report.reference);
    for row in &report.layers {
        println!("  {:>2}  {}  {}", row.index, row.diff_id, row.size_display);
    }

    let top = report.layers.len().to_string();
    for listing in inspector.list(&reference, &[top], true).await? {
        println!("\n--- {} ---", listing.diff_id);
        for entry in listing.entries.iter().take(10) {
            println!(
                "{}  {:>10}  {}",
                entry.mode_string(),
                entry.size_display(),
                entry.name
            );
        }
    }

    Ok(())
}
