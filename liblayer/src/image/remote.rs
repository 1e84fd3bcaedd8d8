use super::layer::BlobSource;
use super::{Image, ImageSource, Resolver, diff_ids_from_config, layers_from_manifest};
use crate::auth::{AnonymousKeychain, Credentials, Keychain};
use crate::client::{Client, ClientConfig};
use crate::config::Registries;
use crate::error::{LayerError, Result};
use crate::oci::{ManifestOrIndex, TargetPlatform};
use crate::reference::Reference;
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

/// Nested indexes deeper than this are rejected.
const MAX_INDEX_DEPTH: usize = 8;

/// Resolves references against remote registries.
///
/// Manifests and the image config are fetched eagerly; layer blobs are only
/// downloaded when a layer's stream is opened.
#[derive(Clone)]
pub struct RegistryResolver {
    keychain: Arc<dyn Keychain>,
    platform: TargetPlatform,
    timeout_seconds: u64,
    registries: Registries,
}

impl Default for RegistryResolver {
    fn default() -> Self {
        Self::new(Arc::new(AnonymousKeychain))
    }
}

impl std::fmt::Debug for RegistryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryResolver")
            .field("platform", &self.platform)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("registries", &self.registries)
            .finish_non_exhaustive()
    }
}

impl RegistryResolver {
    /// Creates a resolver for linux/amd64 with a 30 second timeout.
    pub fn new(keychain: Arc<dyn Keychain>) -> Self {
        Self {
            keychain,
            platform: TargetPlatform::default(),
            timeout_seconds: 30,
            registries: Registries::default(),
        }
    }

    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets which registries are contacted over plain HTTP.
    pub fn with_registries(mut self, registries: Registries) -> Self {
        self.registries = registries;
        self
    }

    fn client_for(&self, reference: &Reference) -> Result<Client> {
        let host = reference.registry_host();
        let scheme = if self.registries.is_insecure(host) {
            "http"
        } else {
            "https"
        };

        let credentials = self
            .keychain
            .resolve(reference.registry())?
            .unwrap_or(Credentials::Anonymous);

        let config = ClientConfig::new().with_timeout(self.timeout_seconds);
        Ok(Client::with_config(&format!("{}://{}", scheme, host), config)?
            .with_credentials(credentials))
    }
}

#[async_trait]
impl Resolver for RegistryResolver {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn resolve(&self, reference: &str) -> Result<Image> {
        let parsed = Reference::from_str(reference)?;
        let client = self.client_for(&parsed)?;
        let repository = parsed.repository().to_string();

        tracing::debug!(
            registry = %client.registry_url(),
            %repository,
            reference = %parsed.manifest_reference(),
            "resolving image from registry"
        );

        let (bytes, _) = client
            .fetch_manifest(&repository, parsed.manifest_reference())
            .await?;
        let mut current = ManifestOrIndex::from_bytes(&bytes)?;

        for _ in 0..MAX_INDEX_DEPTH {
            let manifest = match current {
                ManifestOrIndex::Manifest(manifest) => manifest,
                ManifestOrIndex::Index(_) => {
                    let descriptor = current.find_platform(&self.platform).ok_or_else(|| {
                        LayerError::not_found(
                            format!("platform {}", self.platform),
                            reference.to_string(),
                        )
                    })?;
                    let digest = descriptor.digest().to_string();
                    tracing::debug!(platform = %self.platform, %digest, "selected manifest from index");

                    let (bytes, _) = client.fetch_manifest(&repository, &digest).await?;
                    current = ManifestOrIndex::from_bytes(&bytes)?;
                    continue;
                }
            };

            let config_digest = manifest.config().digest().to_string();
            let diff_ids = diff_ids_from_config(&client.fetch_blob(&repository, &config_digest).await?)?;

            let layers = layers_from_manifest(&manifest, &diff_ids, |_| BlobSource::Registry {
                client: client.clone(),
                repository: repository.clone(),
            })?;
            return Ok(Image::new(reference, ImageSource::Registry, layers));
        }

        Err(LayerError::validation(format!(
            "index nesting deeper than {} levels",
            MAX_INDEX_DEPTH
        )))
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
