//! HTTP client for OCI registry communication.
//!
//! This module provides a thin HTTP client built on reqwest for reading
//! manifests and blobs from OCI-compliant registries. It implements the
//! pull side of the OCI Distribution Specification v2 API, including the
//! `WWW-Authenticate` challenge and token exchange.

use crate::auth::{Challenge, Credentials, TokenResponse};
use crate::digest::Digest;
use crate::error::{LayerError, Result};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use sha2::{Digest as Sha2Digest, Sha256};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
mod tests;

/// Media types accepted when fetching manifests.
const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use liblayer::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

/// HTTP client for OCI registry operations.
///
/// Cloning is cheap; clones share the connection pool and any bearer token
/// obtained from the registry's token service.
#[derive(Debug, Clone)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Base registry URL (e.g., "https://registry.example.com")
    registry_url: String,
    /// Credentials presented to the token service or in Basic auth
    credentials: Credentials,
    /// Authorization header negotiated after a 401 challenge
    authorization: Arc<Mutex<Option<String>>>,
    timeout_seconds: u64,
}

impl Client {
    /// Creates a new client for the specified registry URL with default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::client::Client;
    ///
    /// let client = Client::new("http://localhost:5000").unwrap();
    /// ```
    pub fn new(registry_url: &str) -> Result<Self> {
        Self::with_config(registry_url, ClientConfig::default())
    }

    /// Creates a new client for the specified registry URL with custom configuration.
    pub fn with_config(registry_url: &str, config: ClientConfig) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry_url)?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| LayerError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            credentials: Credentials::Anonymous,
            authorization: Arc::new(Mutex::new(None)),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Sets the credentials used when the registry challenges a request.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Normalizes a registry URL by ensuring it has a scheme and removing trailing slashes.
    fn normalize_url(url: &str) -> Result<String> {
        let url = url.trim();

        if url.is_empty() {
            return Err(LayerError::validation("Registry URL cannot be empty"));
        }

        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };

        let url = url.trim_end_matches('/');

        Ok(url.to_string())
    }

    /// Returns the base registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Fetches a manifest or index for `reference` (tag or digest).
    ///
    /// # Returns
    ///
    /// The raw manifest bytes, and the Docker-Content-Digest header when the
    /// registry sent one.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The registry is unreachable
    /// - The repository or reference does not exist
    /// - Authentication is required and fails
    pub async fn fetch_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<(Vec<u8>, Option<String>)> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );
        tracing::debug!(%url, "fetching manifest");

        let response = self.get(&url, Some(MANIFEST_ACCEPT)).await?;

        let digest = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let manifest_bytes = response
            .bytes()
            .await
            .map_err(|e| LayerError::network_with_source("Failed to read manifest response", e))?;

        Ok((manifest_bytes.to_vec(), digest))
    }

    /// Fetches a blob (layer or config) from the registry.
    ///
    /// Redirects to storage backends are followed by reqwest. The content is
    /// verified against `digest` before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The registry is unreachable
    /// - The blob does not exist
    /// - The digest format is invalid or not sha256
    /// - The downloaded content does not match the expected digest
    pub async fn fetch_blob(&self, repository: &str, digest: &str) -> Result<Vec<u8>> {
        let expected_digest = Digest::from_str(digest)?;
        if expected_digest.algorithm() != "sha256" {
            return Err(LayerError::validation(format!(
                "Unsupported digest algorithm: {}. Only sha256 is currently supported",
                expected_digest.algorithm()
            )));
        }

        let url = format!("{}/v2/{}/blobs/{}", self.registry_url, repository, digest);
        tracing::debug!(%url, "fetching blob");

        let response = self.get(&url, None).await?;

        let blob_bytes = response
            .bytes()
            .await
            .map_err(|e| LayerError::network_with_source("Failed to read blob response", e))?;

        let mut hasher = Sha256::new();
        hasher.update(&blob_bytes);
        let computed_hash = format!("{:x}", hasher.finalize());

        if computed_hash != expected_digest.hex() {
            return Err(LayerError::validation(format!(
                "Blob digest mismatch: expected {}, computed sha256:{}",
                digest, computed_hash
            )));
        }

        Ok(blob_bytes.to_vec())
    }

    /// Sends a GET, answering one authentication challenge if the registry raises it.
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<Response> {
        let response = self.send_get(url, accept).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_response_status(response).await;
        }

        let challenge = response
            .headers()
            .get(reqwest::header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(Challenge::parse)
            .transpose()?;

        match challenge {
            Some(challenge) => {
                self.authenticate(&challenge).await?;
                let retried = self.send_get(url, accept).await?;
                Self::check_response_status(retried).await
            }
            None => Self::check_response_status(response).await,
        }
    }

    async fn send_get(&self, url: &str, accept: Option<&str>) -> Result<Response> {
        let mut request = self.http_client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        if let Some(auth_header) = self.current_authorization() {
            request = request.header(reqwest::header::AUTHORIZATION, auth_header);
        }
        request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e))
    }

    fn current_authorization(&self) -> Option<String> {
        match self.authorization.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_authorization(&self, value: String) {
        match self.authorization.lock() {
            Ok(mut guard) => *guard = Some(value),
            Err(poisoned) => *poisoned.into_inner() = Some(value),
        }
    }

    /// Obtains an Authorization header value for `challenge`.
    ///
    /// Bearer challenges are exchanged at the realm for a token, presenting
    /// Basic credentials when the keychain had some. Basic challenges reuse
    /// the credentials directly.
    async fn authenticate(&self, challenge: &Challenge) -> Result<()> {
        let (realm, service, scope) = match challenge {
            Challenge::Basic { .. } => {
                let header = self.credentials.basic_header().ok_or_else(|| {
                    LayerError::authentication(
                        format!("Registry {} requires credentials", self.registry_url),
                        Some(401),
                    )
                })?;
                self.set_authorization(header);
                return Ok(());
            }
            Challenge::Bearer {
                realm,
                service,
                scope,
            } => (realm, service, scope),
        };

        let mut query = Vec::new();
        if let Some(service) = service {
            query.push(("service", service.as_str()));
        }
        if let Some(scope) = scope {
            query.push(("scope", scope.as_str()));
        }

        tracing::debug!(%realm, ?query, "requesting registry token");

        let mut request = self.http_client.get(realm.as_str()).query(&query);
        if let Credentials::Basic { username, password } = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LayerError::authentication(
                format!("Token request to {} failed", realm),
                Some(status.as_u16()),
            ));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            LayerError::validation_with_source("Failed to parse token response", e)
        })?;
        let token = body.into_token().ok_or_else(|| {
            LayerError::authentication("Token response carried no token", None)
        })?;

        self.set_authorization(format!("Bearer {}", token));
        Ok(())
    }

    /// Translates a reqwest error into a LayerError.
    fn translate_reqwest_error(&self, error: reqwest::Error) -> LayerError {
        if error.is_timeout() {
            LayerError::network(format!(
                "Request to {} timed out after {} seconds",
                self.registry_url, self.timeout_seconds
            ))
        } else if error.is_connect() {
            LayerError::network_with_source(
                format!("Failed to connect to registry at {}", self.registry_url),
                error,
            )
        } else if error.is_request() {
            LayerError::network_with_source(
                format!("Failed to send request to {}", self.registry_url),
                error,
            )
        } else {
            LayerError::network_with_source(
                format!("Network error communicating with {}", self.registry_url),
                error,
            )
        }
    }

    /// Checks the HTTP response status and translates errors to LayerError.
    async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        match status {
            StatusCode::UNAUTHORIZED => Err(LayerError::authentication(
                format!("Authentication required for {}: {}", url, error_body),
                Some(401),
            )),
            StatusCode::FORBIDDEN => Err(LayerError::authentication(
                format!("Access forbidden for {}: {}", url, error_body),
                Some(403),
            )),
            StatusCode::NOT_FOUND => Err(LayerError::not_found("endpoint", &url)),
            StatusCode::TOO_MANY_REQUESTS => Err(LayerError::rate_limit(
                format!("Rate limit exceeded for {}", url),
                retry_after,
            )),
            s if s.is_server_error() => Err(LayerError::server(
                format!("Server error from {}: {}", url, error_body),
                status.as_u16(),
            )),
            _ => Err(LayerError::network(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                error_body
            ))),
        }
    }
}
