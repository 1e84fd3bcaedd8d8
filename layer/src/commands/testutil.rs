use flate2::Compression;
use flate2::write::GzEncoder;
use liblayer::Digest;
use std::io::Write;
use std::path::{Path, PathBuf};

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn append(builder: &mut tar::Builder<Vec<u8>>, name: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, name, data).unwrap();
}

/// Writes a one-layer `docker save` tarball into `dir`.
pub fn saved_image(dir: &Path, files: &[(&str, usize)]) -> PathBuf {
    let mut layer = tar::Builder::new(Vec::new());
    for (name, size) in files {
        append(&mut layer, name, &vec![b'x'; *size]);
    }
    let layer = layer.into_inner().unwrap();
    let diff_id = Digest::sha256(&layer).unwrap().to_string();

    let config = serde_json::json!({
        "architecture": "amd64",
        "os": "linux",
        "rootfs": { "type": "layers", "diff_ids": [diff_id] },
    });
    let manifest = serde_json::json!([{
        "Config": "config.json",
        "RepoTags": ["fixture:latest"],
        "Layers": ["l0/layer.tar"],
    }]);

    let mut image = tar::Builder::new(Vec::new());
    append(&mut image, "l0/layer.tar", &gzip(&layer));
    append(&mut image, "config.json", &serde_json::to_vec(&config).unwrap());
    append(&mut image, "manifest.json", &serde_json::to_vec(&manifest).unwrap());

    let path = dir.join("image.tar");
    std::fs::write(&path, image.into_inner().unwrap()).unwrap();
    path
}
