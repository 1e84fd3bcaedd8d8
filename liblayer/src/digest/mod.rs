//! Content digest validation and manipulation.
//!
//! This module wraps `oci_spec::image::Digest` so that layer selectors, image
//! manifests and blob downloads all share one validated digest type.

use crate::error::{LayerError, Result};
use oci_spec::image::Digest as OciDigest;
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::str::FromStr;


/// Represents a content digest, wrapping the `oci_spec::image::Digest` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl Digest {
    /// Computes the sha256 digest of `bytes`.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::digest::Digest;
    ///
    /// let digest = Digest::sha256(b"").unwrap();
    /// assert_eq!(
    ///     digest.to_string(),
    ///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    /// );
    /// ```
    pub fn sha256(bytes: &[u8]) -> Result<Self> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self::from_sha256_hasher(hasher)
    }

    /// Finishes a running sha256 hash into a digest.
    pub fn from_sha256_hasher(hasher: Sha256) -> Result<Self> {
        let hex = format!("{:x}", hasher.finalize());
        Self::from_str(&format!("sha256:{}", hex))
    }

    /// Returns the algorithm part, e.g. `sha256`.
    pub fn algorithm(&self) -> String {
        self.0.algorithm().to_string()
    }

    /// Returns the encoded hash part after the colon.
    pub fn hex(&self) -> &str {
        self.0.digest()
    }
}

impl FromStr for Digest {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s).map_err(|e| LayerError::Validation {
            message: format!("Invalid digest format: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<OciDigest> for Digest {
    fn from(digest: OciDigest) -> Self {
        Digest(digest)
    }
}

impl serde::Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
