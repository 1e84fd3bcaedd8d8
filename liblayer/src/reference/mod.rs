//! Image references (`[registry/]repository[:tag][@digest]`).
//!
//! Parsing is delegated to `oci_spec::distribution::Reference`; this wrapper
//! adds where to send registry API calls and what to ask for.

use crate::error::{LayerError, Result};
use oci_spec::distribution::Reference as OciReference;
use std::fmt;
use std::str::FromStr;


/// Names Docker Hub goes by in references.
const DOCKER_HUB_ALIASES: [&str; 2] = ["docker.io", "index.docker.io"];

/// Host actually serving the Docker Hub v2 API.
const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

const DEFAULT_TAG: &str = "latest";

/// A parsed, normalized image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    inner: OciReference,
}

impl FromStr for Reference {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self> {
        OciReference::from_str(s)
            .map(|inner| Self { inner })
            .map_err(|e| LayerError::validation_with_source(format!("Invalid image reference '{}'", s), e))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Reference {
    /// Registry as written (or defaulted) in the reference, e.g. `docker.io`.
    pub fn registry(&self) -> &str {
        self.inner.registry()
    }

    /// Repository path, with `library/` added for official Hub images.
    pub fn repository(&self) -> &str {
        self.inner.repository()
    }

    pub fn is_docker_hub(&self) -> bool {
        DOCKER_HUB_ALIASES.contains(&self.registry())
    }

    /// Host that serves the registry API for this reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::reference::Reference;
    /// use std::str::FromStr;
    ///
    /// let hub = Reference::from_str("alpine:3.19").unwrap();
    /// assert_eq!(hub.registry_host(), "registry-1.docker.io");
    ///
    /// let local = Reference::from_str("localhost:5000/app").unwrap();
    /// assert_eq!(local.registry_host(), "localhost:5000");
    /// ```
    pub fn registry_host(&self) -> &str {
        if self.is_docker_hub() {
            DOCKER_HUB_API_HOST
        } else {
            self.registry()
        }
    }

    /// The `<reference>` of `/v2/<name>/manifests/<reference>`: the digest
    /// when pinned, else the tag, else `latest`.
    pub fn manifest_reference(&self) -> &str {
        self.inner
            .digest()
            .or_else(|| self.inner.tag())
            .unwrap_or(DEFAULT_TAG)
    }
}
