//! Reading images out of tarballs on disk.
//!
//! Two layouts are understood. A `docker save` tarball carries a top-level
//! `manifest.json` naming the config and layer members. An OCI image-layout
//! tarball carries `index.json` and content-addressed `blobs/`. Newer docker
//! versions write both; `manifest.json` wins when present.

use super::layer::BlobSource;
use super::{Image, ImageSource, Layer, check_diff_id_count, diff_ids_from_config};
use crate::digest::Digest;
use crate::error::{LayerError, Result};
use crate::oci::{ArchiveManifestEntry, ManifestOrIndex, TargetPlatform};
use sha2::{Digest as Sha2Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempPath;

const DOCKER_MANIFEST: &str = "manifest.json";
const OCI_INDEX: &str = "index.json";

/// Media type reported for layers listed by `manifest.json`.
const DOCKER_LAYER_MEDIA_TYPE: &str = "application/vnd.docker.image.rootfs.diff.tar";

/// Nested indexes deeper than this are rejected.
const MAX_INDEX_DEPTH: usize = 8;

/// A tarball on disk that layers read their blobs from.
///
/// When the tarball was written to a temp file (daemon export), the file is
/// removed once the last layer referring to it is dropped.
#[derive(Debug)]
pub(crate) struct ArchiveFile {
    path: PathBuf,
    _temp: Option<TempPath>,
}

impl ArchiveFile {
    fn new(path: PathBuf, temp: Option<TempPath>) -> Self {
        Self { path, _temp: temp }
    }

    fn open(&self) -> Result<tar::Archive<File>> {
        let file = File::open(&self.path)
            .map_err(|e| LayerError::io(format!("opening {}", self.path.display()), e))?;
        Ok(tar::Archive::new(file))
    }

    /// Walks every member, handing each one to `visit` until it returns false.
    fn scan<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, &mut tar::Entry<'_, File>) -> Result<bool>,
    {
        let mut archive = self.open()?;
        let entries = archive
            .entries()
            .map_err(|e| LayerError::archive(format!("listing {}", self.path.display()), e))?;

        for entry in entries {
            let mut entry = entry
                .map_err(|e| LayerError::archive(format!("reading {}", self.path.display()), e))?;
            let name = member_name(&entry)?;
            if !visit(&name, &mut entry)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns the size of every member.
    fn member_sizes(&self) -> Result<HashMap<String, u64>> {
        let mut sizes = HashMap::new();
        self.scan(|name, entry| {
            sizes.insert(name.to_string(), entry.size());
            Ok(true)
        })?;
        Ok(sizes)
    }

    /// Reads one member fully into memory.
    fn read_member(&self, member: &str) -> Result<Vec<u8>> {
        let mut found = None;
        self.scan(|name, entry| {
            if name != member {
                return Ok(true);
            }
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .map_err(|e| LayerError::archive(format!("reading member {}", member), e))?;
            found = Some(buf);
            Ok(false)
        })?;

        found.ok_or_else(|| {
            LayerError::validation(format!(
                "{} is missing from {}",
                member,
                self.path.display()
            ))
        })
    }

    /// Copies one member into an anonymous temp file, rewound to the start.
    pub(crate) fn spool_member(&self, member: &str) -> Result<File> {
        let mut spooled = None;
        self.scan(|name, entry| {
            if name != member {
                return Ok(true);
            }
            let mut file =
                tempfile::tempfile().map_err(|e| LayerError::io("creating temp file", e))?;
            io::copy(entry, &mut file)
                .map_err(|e| LayerError::archive(format!("reading member {}", member), e))?;
            file.seek(SeekFrom::Start(0))
                .map_err(|e| LayerError::io("rewinding temp file", e))?;
            spooled = Some(file);
            Ok(false)
        })?;

        spooled.ok_or_else(|| {
            LayerError::validation(format!(
                "{} is missing from {}",
                member,
                self.path.display()
            ))
        })
    }

    /// Computes the sha256 digest of each named member in one pass.
    fn hash_members(&self, members: &HashSet<&str>) -> Result<HashMap<String, Digest>> {
        let mut digests = HashMap::new();
        if members.is_empty() {
            return Ok(digests);
        }

        self.scan(|name, entry| {
            if members.contains(name) {
                let mut hasher = Sha256::new();
                io::copy(entry, &mut hasher)
                    .map_err(|e| LayerError::archive(format!("hashing member {}", name), e))?;
                digests.insert(name.to_string(), Digest::from_sha256_hasher(hasher)?);
            }
            Ok(digests.len() < members.len())
        })?;
        Ok(digests)
    }
}

fn member_name(entry: &tar::Entry<'_, File>) -> Result<String> {
    let path = entry
        .path()
        .map_err(|e| LayerError::archive("decoding member path", e))?;
    let name = path.to_string_lossy();
    Ok(name.trim_start_matches("./").to_string())
}

/// Derives a digest from a `blobs/<alg>/<hex>` member path.
fn digest_from_blob_path(member: &str) -> Option<Digest> {
    let rest = member.strip_prefix("blobs/")?;
    let (algorithm, hex) = rest.split_once('/')?;
    Digest::from_str(&format!("{}:{}", algorithm, hex)).ok()
}

fn blob_path(digest: &Digest) -> String {
    format!("blobs/{}/{}", digest.algorithm(), digest.hex())
}

/// Reads an image out of the tarball at `path`.
///
/// `temp` keeps a temporary tarball alive for as long as the returned
/// image's layers need it. `platform` picks a manifest when an OCI layout
/// holds an index with several platforms.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a tar archive, or
/// holds neither `manifest.json` nor `index.json`.
pub fn read_archive(
    path: &Path,
    reference: &str,
    source: ImageSource,
    platform: &TargetPlatform,
) -> Result<Image> {
    read_archive_with_guard(path, reference, source, platform, None)
}

pub(crate) fn read_archive_with_guard(
    path: &Path,
    reference: &str,
    source: ImageSource,
    platform: &TargetPlatform,
    temp: Option<TempPath>,
) -> Result<Image> {
    let archive = Arc::new(ArchiveFile::new(path.to_path_buf(), temp));
    let sizes = archive.member_sizes()?;
    tracing::debug!(path = %path.display(), members = sizes.len(), "scanned image archive");

    let layers = if sizes.contains_key(DOCKER_MANIFEST) {
        docker_save_layers(&archive, &sizes)?
    } else if sizes.contains_key(OCI_INDEX) {
        oci_layout_layers(&archive, platform)?
    } else {
        return Err(LayerError::validation(format!(
            "{} contains neither {} nor {}",
            path.display(),
            DOCKER_MANIFEST,
            OCI_INDEX
        )));
    };

    Ok(Image::new(reference, source, layers))
}

fn docker_save_layers(
    archive: &Arc<ArchiveFile>,
    sizes: &HashMap<String, u64>,
) -> Result<Vec<Layer>> {
    let entries = ArchiveManifestEntry::parse_list(&archive.read_member(DOCKER_MANIFEST)?)?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| LayerError::validation("manifest.json lists no images"))?;

    let diff_ids = diff_ids_from_config(&archive.read_member(&entry.config)?)?;
    check_diff_id_count(diff_ids.len(), entry.layers.len())?;

    let unaddressed: HashSet<&str> = entry
        .layers
        .iter()
        .filter(|m| digest_from_blob_path(m).is_none())
        .map(String::as_str)
        .collect();
    let computed = archive.hash_members(&unaddressed)?;

    entry
        .layers
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let size = *sizes.get(member).ok_or_else(|| {
                LayerError::validation(format!("layer {} is missing from the archive", member))
            })?;
            let digest = match digest_from_blob_path(member) {
                Some(digest) => digest,
                None => computed.get(member).cloned().ok_or_else(|| {
                    LayerError::validation(format!("layer {} could not be hashed", member))
                })?,
            };

            Ok(Layer::new(
                digest,
                diff_ids.get(i).cloned(),
                size,
                DOCKER_LAYER_MEDIA_TYPE.to_string(),
                BlobSource::Archive {
                    archive: Arc::clone(archive),
                    member: member.clone(),
                },
            ))
        })
        .collect()
}

fn oci_layout_layers(archive: &Arc<ArchiveFile>, platform: &TargetPlatform) -> Result<Vec<Layer>> {
    let mut current = ManifestOrIndex::from_bytes(&archive.read_member(OCI_INDEX)?)?;

    for _ in 0..MAX_INDEX_DEPTH {
        let manifest = match current {
            ManifestOrIndex::Manifest(manifest) => manifest,
            ManifestOrIndex::Index(_) => {
                let descriptor = current.find_platform(platform).ok_or_else(|| {
                    LayerError::not_found("platform".to_string(), platform.to_string())
                })?;
                let digest = Digest::from(descriptor.digest().clone());
                current = ManifestOrIndex::from_bytes(&archive.read_member(&blob_path(&digest))?)?;
                continue;
            }
        };

        let config_digest = Digest::from(manifest.config().digest().clone());
        let diff_ids = diff_ids_from_config(&archive.read_member(&blob_path(&config_digest))?)?;

        return super::layers_from_manifest(&manifest, &diff_ids, |desc| BlobSource::Archive {
            archive: Arc::clone(archive),
            member: blob_path(&Digest::from(desc.digest().clone())),
        });
    }

    Err(LayerError::validation(format!(
        "index nesting deeper than {} levels",
        MAX_INDEX_DEPTH
    )))
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
