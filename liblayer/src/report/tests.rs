use super::*;
use crate::error::LayerError;
use crate::image::{ImageSource, Layer};

fn layer_of_size(size: usize, diff_seed: Option<&[u8]>) -> Layer {
    let diff_id = diff_seed.map(|seed| Digest::sha256(seed).unwrap());
    Layer::from_bytes(vec![0u8; size], diff_id).unwrap()
}

fn image_of(layers: Vec<Layer>) -> Image {
    Image::new("alpine", ImageSource::Archive, layers)
}

#[test]
fn test_single_layer_row() {
    let image = image_of(vec![layer_of_size(1000, Some(b"aaa"))]);

    let report = build_report(&image).unwrap();

    assert_eq!(report.reference, "alpine");
    assert_eq!(report.layers.len(), 1);
    let row = &report.layers[0];
    assert_eq!(row.index, 1);
    assert_eq!(row.diff_id, Digest::sha256(b"aaa").unwrap());
    assert_eq!(row.size, 1000);
    assert_eq!(row.size_display, "1.0 kB");
}

#[test]
fn test_rows_are_numbered_in_order() {
    let image = image_of(vec![
        layer_of_size(10, Some(b"one")),
        layer_of_size(1200, Some(b"two")),
        layer_of_size(999, Some(b"three")),
    ]);

    let rows = build_report(&image).unwrap().layers;

    let indexes: Vec<usize> = rows.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![1, 2, 3]);
    assert_eq!(rows[0].size_display, "10 B");
    assert_eq!(rows[1].size_display, "1.2 kB");
    assert_eq!(rows[2].size_display, "999 B");
}

#[test]
fn test_empty_image_gives_empty_report() {
    let report = build_report(&image_of(Vec::new())).unwrap();

    assert!(report.layers.is_empty());
}

#[test]
fn test_missing_diff_id_aborts_report() {
    let image = image_of(vec![layer_of_size(10, Some(b"one")), layer_of_size(10, None)]);

    let err = build_report(&image).unwrap_err();

    assert!(matches!(err, LayerError::Validation { .. }));
}

#[test]
fn test_report_serializes_digests_as_strings() {
    let report = build_report(&image_of(vec![layer_of_size(5, Some(b"x"))])).unwrap();

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["reference"], "alpine");
    assert_eq!(
        json["layers"][0]["diff_id"],
        Digest::sha256(b"x").unwrap().to_string()
    );
    assert_eq!(json["layers"][0]["size_display"], "5 B");
}
