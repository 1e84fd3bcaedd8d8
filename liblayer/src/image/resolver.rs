use super::archive::read_archive;
use super::{DaemonResolver, Image, ImageSource, RegistryResolver};
use crate::auth::Keychain;
use crate::config::Config;
use crate::error::{LayerError, Result};
use crate::oci::TargetPlatform;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// A strategy for turning a reference string into an [`Image`].
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Resolves `reference`, or explains why this strategy cannot.
    async fn resolve(&self, reference: &str) -> Result<Image>;
}

/// Treats the reference as a path to an image tarball.
#[derive(Debug, Clone, Default)]
pub struct ArchiveResolver {
    platform: TargetPlatform,
}

impl ArchiveResolver {
    pub fn new(platform: TargetPlatform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Resolver for ArchiveResolver {
    fn name(&self) -> &'static str {
        "archive"
    }

    async fn resolve(&self, reference: &str) -> Result<Image> {
        let path = Path::new(reference);
        if !path.is_file() {
            return Err(LayerError::not_found("archive", reference));
        }
        read_archive(path, reference, ImageSource::Archive, &self.platform)
    }
}

/// Tries resolvers in order and keeps the first image found.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverChain {
    /// Creates a chain from an explicit resolver list.
    pub fn new(resolvers: Vec<Box<dyn Resolver>>) -> Self {
        Self { resolvers }
    }

    /// Builds the standard archive, daemon, registry chain.
    ///
    /// The daemon resolver is left out when `config.daemon.enabled` is false.
    pub fn from_config(config: &Config, keychain: Arc<dyn Keychain>) -> Self {
        let mut resolvers: Vec<Box<dyn Resolver>> =
            vec![Box::new(ArchiveResolver::new(config.platform.clone()))];

        if config.daemon.enabled {
            resolvers.push(Box::new(DaemonResolver::new(
                config.daemon.command.clone(),
                config.platform.clone(),
            )));
        }

        resolvers.push(Box::new(
            RegistryResolver::new(keychain)
                .with_platform(config.platform.clone())
                .with_timeout(config.network.timeout)
                .with_registries(config.registries.clone()),
        ));

        Self::new(resolvers)
    }

    /// Names of the resolvers, in the order they are tried.
    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolves `reference` with the first resolver that succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::ImageNotFound`] when the reference is empty or
    /// every resolver fails. Individual failures are logged at debug level.
    pub async fn resolve(&self, reference: &str) -> Result<Image> {
        if reference.trim().is_empty() {
            return Err(LayerError::image_not_found(reference));
        }

        for resolver in &self.resolvers {
            match resolver.resolve(reference).await {
                Ok(image) => {
                    tracing::info!(
                        resolver = resolver.name(),
                        %reference,
                        layers = image.layers().len(),
                        "resolved image"
                    );
                    return Ok(image);
                }
                Err(err) => {
                    tracing::debug!(resolver = resolver.name(), %reference, error = %err, "resolver failed");
                }
            }
        }

        Err(LayerError::image_not_found(reference))
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
