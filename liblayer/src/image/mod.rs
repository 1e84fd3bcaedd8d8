//! Container images and their layers.
//!
//! An [`Image`] is an ordered list of [`Layer`]s obtained from one of three
//! places: a tarball on disk, the local image daemon, or a remote registry.
//! Each source has a [`Resolver`]; a [`ResolverChain`] tries them in order
//! and keeps the first image that resolves.

mod archive;
mod daemon;
mod layer;
mod remote;
mod resolver;

pub use archive::read_archive;
pub use daemon::DaemonResolver;
pub use layer::Layer;
pub use remote::RegistryResolver;
pub use resolver::{ArchiveResolver, Resolver, ResolverChain};

use crate::digest::Digest;
use crate::error::{LayerError, Result};
use crate::oci::{Descriptor, ImageConfiguration, ImageManifest};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;


/// Where an image was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// A `docker save` or OCI layout tarball on disk
    Archive,
    /// Exported from the local image daemon
    Daemon,
    /// Pulled from a remote registry
    Registry,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Archive => write!(f, "archive"),
            ImageSource::Daemon => write!(f, "daemon"),
            ImageSource::Registry => write!(f, "registry"),
        }
    }
}

/// A resolved image: its layers, base layer first.
#[derive(Debug, Clone)]
pub struct Image {
    reference: String,
    source: ImageSource,
    layers: Vec<Layer>,
}

impl Image {
    /// Creates an image from already resolved layers.
    pub fn new(reference: impl Into<String>, source: ImageSource, layers: Vec<Layer>) -> Self {
        Self {
            reference: reference.into(),
            source,
            layers,
        }
    }

    /// The reference string the image was resolved from.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }

    /// The layers in manifest order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Finds the layer whose compressed digest is `digest`.
    pub fn layer_by_digest(&self, digest: &Digest) -> Option<&Layer> {
        self.layers.iter().find(|l| l.digest() == digest)
    }

    /// Finds the layer whose uncompressed-content digest is `diff_id`.
    pub fn layer_by_diff_id(&self, diff_id: &Digest) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| l.diff_id_opt() == Some(diff_id))
    }
}

/// Reads `rootfs.diff_ids` out of an image config blob.
pub(crate) fn diff_ids_from_config(bytes: &[u8]) -> Result<Vec<Digest>> {
    let config: ImageConfiguration = serde_json::from_slice(bytes)
        .map_err(|e| LayerError::validation_with_source("Failed to parse image config", e))?;

    config
        .rootfs()
        .diff_ids()
        .iter()
        .map(|id| Digest::from_str(id))
        .collect()
}

/// Builds layers from manifest descriptors, pairing each with its diff ID.
///
/// `source` produces the blob source for a descriptor.
pub(crate) fn layers_from_manifest<F>(
    manifest: &ImageManifest,
    diff_ids: &[Digest],
    mut source: F,
) -> Result<Vec<Layer>>
where
    F: FnMut(&Descriptor) -> layer::BlobSource,
{
    let descriptors = manifest.layers();
    check_diff_id_count(diff_ids.len(), descriptors.len())?;

    Ok(descriptors
        .iter()
        .enumerate()
        .map(|(i, desc)| {
            Layer::new(
                Digest::from(desc.digest().clone()),
                diff_ids.get(i).cloned(),
                desc.size(),
                desc.media_type().to_string(),
                source(desc),
            )
        })
        .collect())
}

/// Fails when the config lists more diff IDs than there are layers.
///
/// Fewer diff IDs are tolerated; the missing ones surface from
/// [`Layer::diff_id`].
pub(crate) fn check_diff_id_count(diff_ids: usize, layers: usize) -> Result<()> {
    if diff_ids > layers {
        return Err(LayerError::validation(format!(
            "Image config lists {} diff IDs for {} layers",
            diff_ids, layers
        )));
    }
    Ok(())
}
