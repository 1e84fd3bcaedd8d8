//! Per-layer summary rows for `inspect`.

use crate::digest::Digest;
use crate::error::Result;
use crate::format::format_size;
use crate::image::Image;
use serde::Serialize;

#[cfg(test)]
mod tests;

/// One row of the layer report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRow {
    /// 1-based position in the image
    pub index: usize,
    /// Digest of the uncompressed layer content
    pub diff_id: Digest,
    /// Stored (compressed) size in bytes
    pub size: u64,
    /// `size` in human-readable decimal units
    pub size_display: String,
}

/// All layers of an image, base layer first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerReport {
    pub reference: String,
    pub layers: Vec<LayerRow>,
}

/// Builds one row per layer of `image`, numbered from 1.
///
/// # Errors
///
/// Fails on the first layer whose diff ID is unknown; no partial report is
/// returned.
pub fn build_report(image: &Image) -> Result<LayerReport> {
    let layers = image
        .layers()
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            Ok(LayerRow {
                index: i + 1,
                diff_id: layer.diff_id()?.clone(),
                size: layer.size(),
                size_display: format_size(layer.size()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LayerReport {
        reference: image.reference().to_string(),
        layers,
    })
}
