use super::*;
use crate::testutil::{Member, gzip, tar_bytes};

async fn read_all(layer: &Layer) -> Vec<u8> {
    let mut reader = layer.uncompressed().await.unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    out
}

#[tokio::test]
async fn test_uncompressed_plain_tar_passes_through() {
    let tar = tar_bytes(&[Member::File("etc/hostname", b"box\n", 0o644)]);
    let layer = Layer::from_bytes(tar.clone(), None).unwrap();

    assert_eq!(read_all(&layer).await, tar);
}

#[tokio::test]
async fn test_uncompressed_detects_gzip() {
    let tar = tar_bytes(&[Member::File("a", b"hello", 0o644)]);
    let layer = Layer::from_bytes(gzip(&tar), None).unwrap();

    assert_eq!(read_all(&layer).await, tar);
}

#[tokio::test]
async fn test_uncompressed_detects_zstd() {
    let tar = tar_bytes(&[Member::File("a", b"hello", 0o644)]);
    let compressed = zstd::stream::encode_all(&tar[..], 3).unwrap();
    let layer = Layer::from_bytes(compressed, None).unwrap();

    assert_eq!(read_all(&layer).await, tar);
}

#[tokio::test]
async fn test_uncompressed_empty_blob() {
    let layer = Layer::from_bytes(Vec::new(), None).unwrap();

    assert!(read_all(&layer).await.is_empty());
}

#[test]
fn test_from_bytes_computes_digest_and_size() {
    let layer = Layer::from_bytes(b"hello".to_vec(), None).unwrap();

    assert_eq!(
        layer.digest().to_string(),
        "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(layer.size(), 5);
    assert_eq!(layer.media_type(), "application/vnd.oci.image.layer.v1.tar");
}

#[test]
fn test_diff_id_missing_is_validation_error() {
    let layer = Layer::from_bytes(b"x".to_vec(), None).unwrap();

    let err = layer.diff_id().unwrap_err();
    assert!(matches!(err, LayerError::Validation { .. }));
    assert!(err.to_string().contains("no diff ID"));
}

#[test]
fn test_diff_id_present() {
    let diff_id = Digest::sha256(b"uncompressed").unwrap();
    let layer = Layer::from_bytes(b"x".to_vec(), Some(diff_id.clone())).unwrap();

    assert_eq!(layer.diff_id().unwrap(), &diff_id);
}
