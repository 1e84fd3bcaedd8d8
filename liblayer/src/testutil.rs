//! Fixture builders shared by the unit tests.

use crate::digest::Digest;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One member of a generated tar stream.
pub(crate) enum Member<'a> {
    File(&'a str, &'a [u8], u32),
    Dir(&'a str),
    Symlink(&'a str, &'a str),
}

/// Builds an uncompressed tar stream.
pub(crate) fn tar_bytes(members: &[Member<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for member in members {
        let mut header = tar::Header::new_gnu();
        match member {
            Member::File(name, data, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder.append_data(&mut header, name, *data).unwrap();
            }
            Member::Dir(name) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder.append_data(&mut header, name, &[][..]).unwrap();
            }
            Member::Symlink(name, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                header.set_mode(0o777);
                builder.append_link(&mut header, name, target).unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}

pub(crate) fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub(crate) fn diff_id_of(uncompressed: &[u8]) -> Digest {
    Digest::sha256(uncompressed).unwrap()
}

pub(crate) fn config_json(diff_ids: &[Digest]) -> Vec<u8> {
    let ids: Vec<String> = diff_ids.iter().map(|d| d.to_string()).collect();
    serde_json::to_vec(&serde_json::json!({
        "architecture": "amd64",
        "os": "linux",
        "rootfs": { "type": "layers", "diff_ids": ids },
    }))
    .unwrap()
}

/// Writes a `docker save` style tarball holding `layers` (uncompressed tar
/// streams) under `dir`. Layers are gzipped when `compress` is set.
pub(crate) fn docker_save(dir: &Path, layers: &[Vec<u8>], compress: bool) -> PathBuf {
    let diff_ids: Vec<Digest> = layers.iter().map(|l| diff_id_of(l)).collect();
    let config = config_json(&diff_ids);

    let mut members: Vec<(String, Vec<u8>)> = Vec::new();
    let mut layer_names = Vec::new();
    for (i, layer) in layers.iter().enumerate() {
        let name = format!("layer{}/layer.tar", i);
        let blob = if compress { gzip(layer) } else { layer.clone() };
        members.push((name.clone(), blob));
        layer_names.push(name);
    }
    members.push(("config.json".to_string(), config));
    let manifest = serde_json::to_vec(&serde_json::json!([{
        "Config": "config.json",
        "RepoTags": ["test:latest"],
        "Layers": layer_names,
    }]))
    .unwrap();
    members.push(("manifest.json".to_string(), manifest));

    let path = dir.join("image.tar");
    let refs: Vec<Member<'_>> = members
        .iter()
        .map(|(name, data)| Member::File(name, data, 0o644))
        .collect();
    std::fs::write(&path, tar_bytes(&refs)).unwrap();
    path
}
