//! OCI and Docker image data structures.
//!
//! Re-exports the `oci-spec` types used by the registry and archive readers,
//! and adds the two shapes `oci-spec` does not model: the legacy
//! `docker save` manifest and a target platform selector.

pub use oci_spec::image::{Descriptor, ImageConfiguration, ImageIndex, ImageManifest, Platform};

use crate::error::{LayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents either a single-platform image manifest or a multi-platform image index.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum ManifestOrIndex {
    /// A single-platform image manifest
    Manifest(ImageManifest),
    /// A multi-platform image index
    Index(ImageIndex),
}

impl ManifestOrIndex {
    /// Parse manifest bytes, automatically detecting whether it's a Manifest or Index.
    ///
    /// This method inspects the JSON to determine the schema version and media type,
    /// then deserializes accordingly.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| LayerError::validation_with_source("Failed to parse manifest JSON", e))?;

        let media_type = value
            .get("mediaType")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let is_index = if media_type.contains("index") || media_type.contains("list") {
            true
        } else if media_type.contains("manifest") {
            false
        } else if value.get("manifests").is_some() {
            // No mediaType field (allowed for OCI layouts), infer from structure
            true
        } else if value.get("layers").is_some() || value.get("config").is_some() {
            false
        } else {
            return Err(LayerError::validation(
                "Unable to determine if content is a manifest or index",
            ));
        };

        if is_index {
            let index: ImageIndex = serde_json::from_value(value).map_err(|e| {
                LayerError::validation_with_source("Failed to parse image index", e)
            })?;
            Ok(ManifestOrIndex::Index(index))
        } else {
            let manifest: ImageManifest = serde_json::from_value(value).map_err(|e| {
                LayerError::validation_with_source("Failed to parse image manifest", e)
            })?;
            Ok(ManifestOrIndex::Manifest(manifest))
        }
    }

    /// Returns true if this is a multi-platform index.
    pub fn is_index(&self) -> bool {
        matches!(self, ManifestOrIndex::Index(_))
    }

    /// Find the manifest descriptor matching `target` in an index.
    ///
    /// Index entries without a platform (attestations, nested layouts) are
    /// only chosen when no entry carries platform information at all and
    /// the index holds exactly one manifest.
    pub fn find_platform(&self, target: &TargetPlatform) -> Option<&Descriptor> {
        match self {
            ManifestOrIndex::Manifest(_) => None,
            ManifestOrIndex::Index(index) => {
                let manifests = index.manifests();
                let found = manifests.iter().find(|desc| {
                    desc.platform()
                        .as_ref()
                        .is_some_and(|p| target.matches(p))
                });
                match found {
                    Some(desc) => Some(desc),
                    None if manifests.len() == 1 && manifests[0].platform().is_none() => {
                        manifests.first()
                    }
                    None => None,
                }
            }
        }
    }
}

/// One entry of the `manifest.json` written by `docker save`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveManifestEntry {
    /// Archive member holding the image config JSON.
    #[serde(rename = "Config")]
    pub config: String,

    /// Tags the image was saved under.
    #[serde(rename = "RepoTags", default)]
    pub repo_tags: Option<Vec<String>>,

    /// Archive members holding the layer blobs, base layer first.
    #[serde(rename = "Layers")]
    pub layers: Vec<String>,
}

impl ArchiveManifestEntry {
    /// Parses the `manifest.json` array of a `docker save` archive.
    pub fn parse_list(bytes: &[u8]) -> Result<Vec<Self>> {
        serde_json::from_slice(bytes)
            .map_err(|e| LayerError::validation_with_source("Failed to parse manifest.json", e))
    }
}

/// The os/architecture(/variant) an image is wanted for.
///
/// # Examples
///
/// ```
/// use liblayer::oci::TargetPlatform;
/// use std::str::FromStr;
///
/// let platform = TargetPlatform::from_str("linux/arm64/v8").unwrap();
/// assert_eq!(platform.architecture, "arm64");
/// assert_eq!(platform.variant.as_deref(), Some("v8"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPlatform {
    pub os: String,
    pub architecture: String,
    #[serde(default)]
    pub variant: Option<String>,
}

impl Default for TargetPlatform {
    fn default() -> Self {
        Self {
            os: "linux".to_string(),
            architecture: "amd64".to_string(),
            variant: None,
        }
    }
}

impl TargetPlatform {
    /// Returns true if an index entry's platform satisfies this target.
    ///
    /// The variant is only compared when the target names one.
    pub fn matches(&self, platform: &Platform) -> bool {
        if platform.os().to_string() != self.os
            || platform.architecture().to_string() != self.architecture
        {
            return false;
        }
        match &self.variant {
            Some(wanted) => platform.variant().as_deref() == Some(wanted.as_str()),
            None => true,
        }
    }
}

impl FromStr for TargetPlatform {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        match parts.as_slice() {
            [os, arch] if !os.is_empty() && !arch.is_empty() => Ok(Self {
                os: os.to_string(),
                architecture: arch.to_string(),
                variant: None,
            }),
            [os, arch, variant] if !os.is_empty() && !arch.is_empty() && !variant.is_empty() => {
                Ok(Self {
                    os: os.to_string(),
                    architecture: arch.to_string(),
                    variant: Some(variant.to_string()),
                })
            }
            _ => Err(LayerError::validation(format!(
                "Invalid platform '{}': expected os/arch[/variant]",
                s
            ))),
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}
