//! High-level API for liblayer.
//!
//! This module provides the entry point most users want: resolve a
//! reference, then report on its layers or list the files inside them.
//!
//! # Examples
//!
//! ```no_run
//! use liblayer::Inspector;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inspector = Inspector::new();
//!
//!     // One row per layer
//!     let report = inspector.inspect("alpine:3.19").await?;
//!     for row in &report.layers {
//!         println!("{}  {}  {}", row.index, row.diff_id, row.size_display);
//!     }
//!
//!     // Files of the first layer, largest first
//!     for listing in inspector.list("alpine:3.19", &["1"], true).await? {
//!         for entry in &listing.entries {
//!             println!("{}  {}", entry.size_display(), entry.name);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::auth::{DockerConfigKeychain, Keychain};
use crate::config::Config;
use crate::error::Result;
use crate::image::{Image, Resolver, ResolverChain};
use crate::listing::{LayerListing, list_layer};
use crate::oci::TargetPlatform;
use crate::report::{LayerReport, build_report};
use crate::select::select_layers;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves image references and inspects their layers.
///
/// References are tried as a tarball path, then against the local image
/// daemon, then against the registry they name.
///
/// # Examples
///
/// ## Defaults
///
/// ```no_run
/// use liblayer::Inspector;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let inspector = Inspector::new();
///     let image = inspector.open("./image.tar").await?;
///     println!("{} layers", image.layers().len());
///     Ok(())
/// }
/// ```
///
/// ## With a platform and no daemon
///
/// ```no_run
/// use liblayer::{Config, Inspector};
/// use liblayer::oci::TargetPlatform;
/// use std::str::FromStr;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut config = Config::default();
///     config.daemon.enabled = false;
///
///     let inspector = Inspector::builder()
///         .config(config)
///         .platform(TargetPlatform::from_str("linux/arm64")?)
///         .build();
///
///     let report = inspector.inspect("ghcr.io/org/app:1.0").await?;
///     Ok(())
/// }
/// ```
pub struct Inspector {
    chain: ResolverChain,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    /// Creates an inspector with default configuration and the docker
    /// `config.json` keychain.
    pub fn new() -> Self {
        InspectorBuilder::new().build()
    }

    /// Create a builder for advanced configuration.
    pub fn builder() -> InspectorBuilder {
        InspectorBuilder::new()
    }

    /// Names of the resolvers, in the order they are tried.
    pub fn resolvers(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Resolves `reference` into an image.
    ///
    /// # Errors
    ///
    /// Returns `LayerError::ImageNotFound` when the reference is empty or no
    /// resolver could produce an image.
    pub async fn open(&self, reference: &str) -> Result<Image> {
        self.chain.resolve(reference).await
    }

    /// Reports the diff ID and size of every layer of `reference`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use liblayer::Inspector;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let report = Inspector::new().inspect("nginx:latest").await?;
    ///     println!("{} layers", report.layers.len());
    ///     Ok(())
    /// }
    /// ```
    pub async fn inspect(&self, reference: &str) -> Result<LayerReport> {
        let image = self.open(reference).await?;
        build_report(&image)
    }

    /// Lists the files of the layers selected by `tokens`.
    ///
    /// Each token is a 1-based layer position or a digest; no tokens means
    /// every layer. Layers are processed one at a time and the first error
    /// ends the listing.
    pub async fn list<S: AsRef<str>>(
        &self,
        reference: &str,
        tokens: &[S],
        sort: bool,
    ) -> Result<Vec<LayerListing>> {
        let image = self.open(reference).await?;
        let selected = select_layers(&image, tokens)?;

        let mut listings = Vec::with_capacity(selected.len());
        for layer in selected {
            listings.push(list_layer(layer, sort).await?);
        }
        Ok(listings)
    }
}

/// Builder for [`Inspector`].
#[derive(Default)]
pub struct InspectorBuilder {
    config: Option<Config>,
    platform: Option<TargetPlatform>,
    keychain: Option<Arc<dyn Keychain>>,
    resolvers: Option<Vec<Box<dyn Resolver>>>,
}

impl InspectorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration directly.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the configured platform.
    pub fn platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set the keychain handed to the registry resolver.
    pub fn keychain(mut self, keychain: Arc<dyn Keychain>) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// Replace the standard resolver chain.
    ///
    /// The configuration, platform and keychain are ignored when a custom
    /// resolver list is given.
    pub fn resolvers(mut self, resolvers: Vec<Box<dyn Resolver>>) -> Self {
        self.resolvers = Some(resolvers);
        self
    }

    /// Build the `Inspector` instance.
    pub fn build(self) -> Inspector {
        if let Some(resolvers) = self.resolvers {
            return Inspector {
                chain: ResolverChain::new(resolvers),
            };
        }

        let mut config = self.config.unwrap_or_default();
        if let Some(platform) = self.platform {
            config.platform = platform;
        }

        let keychain: Arc<dyn Keychain> = match self.keychain {
            Some(keychain) => keychain,
            None => Arc::new(match &config.auth.docker_config {
                Some(path) => DockerConfigKeychain::new(PathBuf::from(path)),
                None => DockerConfigKeychain::from_default_location(),
            }),
        };

        tracing::debug!(platform = %config.platform, daemon = config.daemon.enabled, "building inspector");

        Inspector {
            chain: ResolverChain::from_config(&config, keychain),
        }
    }
}

#[cfg(test)]
#[path = "inspector_tests.rs"]
mod tests;
