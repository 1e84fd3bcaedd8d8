use super::*;
use crate::auth::Credentials;
use mockito::Matcher;

fn sha256_of(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

#[test]
fn test_client_new_with_valid_url() {
    let client = Client::new("http://localhost:5000");
    assert!(client.is_ok());
}

#[test]
fn test_client_new_with_https_url() {
    let client = Client::new("https://registry.example.com").unwrap();
    assert_eq!(client.registry_url(), "https://registry.example.com");
}

#[test]
fn test_client_normalizes_url_without_scheme() {
    let client = Client::new("localhost:5000").unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn test_client_removes_multiple_trailing_slashes() {
    let client = Client::new("http://localhost:5000///").unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn test_client_new_with_empty_url_fails() {
    let client = Client::new("   ");
    assert!(matches!(client.unwrap_err(), LayerError::Validation { .. }));
}

#[test]
fn test_client_config_default() {
    let config = ClientConfig::new();
    assert_eq!(config.timeout_seconds, 30);
    assert_eq!(config.max_idle_per_host, 10);
}

#[test]
fn test_client_config_builder_chaining() {
    let config = ClientConfig::new()
        .with_timeout(120)
        .with_max_idle_per_host(50);
    assert_eq!(config.timeout_seconds, 120);
    assert_eq!(config.max_idle_per_host, 50);
}

#[test]
fn test_manifest_accept_lists_oci_and_docker_types() {
    assert!(MANIFEST_ACCEPT.contains("application/vnd.oci.image.manifest.v1+json"));
    assert!(MANIFEST_ACCEPT.contains("application/vnd.oci.image.index.v1+json"));
    assert!(MANIFEST_ACCEPT.contains("application/vnd.docker.distribution.manifest.v2+json"));
    assert!(MANIFEST_ACCEPT.contains("application/vnd.docker.distribution.manifest.list.v2+json"));
}

#[tokio::test]
async fn test_fetch_manifest_success() {
    let mut server = mockito::Server::new_async().await;
    let manifest_body =
        r#"{"schemaVersion":2,"mediaType":"application/vnd.docker.distribution.manifest.v2+json"}"#;

    let mock = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("accept", Matcher::Regex("manifest\\.v2\\+json".to_string()))
        .with_status(200)
        .with_header("Docker-Content-Digest", "sha256:abc123")
        .with_body(manifest_body)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let (bytes, digest) = client.fetch_manifest("alpine", "latest").await.unwrap();

    mock.assert_async().await;
    assert_eq!(bytes, manifest_body.as_bytes());
    assert_eq!(digest.as_deref(), Some("sha256:abc123"));
}

#[tokio::test]
async fn test_fetch_manifest_without_digest_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let (_, digest) = client.fetch_manifest("alpine", "latest").await.unwrap();

    mock.assert_async().await;
    assert_eq!(digest, None);
}

#[tokio::test]
async fn test_fetch_manifest_not_found() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/alpine/manifests/nonexistent")
        .with_status(404)
        .with_body("manifest unknown")
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_manifest("alpine", "nonexistent").await;

    mock.assert_async().await;
    assert!(matches!(result.unwrap_err(), LayerError::NotFound { .. }));
}

#[tokio::test]
async fn test_fetch_blob_success() {
    let mut server = mockito::Server::new_async().await;
    let blob_content = b"test blob content";
    let digest = sha256_of(blob_content);

    let mock = server
        .mock("GET", format!("/v2/alpine/blobs/{}", digest).as_str())
        .with_status(200)
        .with_body(blob_content)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let bytes = client.fetch_blob("alpine", &digest).await.unwrap();

    mock.assert_async().await;
    assert_eq!(bytes, blob_content);
}

#[tokio::test]
async fn test_fetch_blob_digest_mismatch() {
    let mut server = mockito::Server::new_async().await;
    let digest = "sha256:4abcf20661432fb2d719b4568d94db3b6cf9b44bf2a3e1c2c6d0c89fd9e6e0b2";

    let mock = server
        .mock("GET", format!("/v2/alpine/blobs/{}", digest).as_str())
        .with_status(200)
        .with_body("wrong content")
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_blob("alpine", digest).await;

    mock.assert_async().await;
    let err = result.unwrap_err();
    assert!(matches!(err, LayerError::Validation { .. }));
    assert!(err.to_string().contains("digest mismatch"));
}

#[tokio::test]
async fn test_fetch_blob_unsupported_algorithm_skips_request() {
    let server = mockito::Server::new_async().await;
    let client = Client::new(&server.url()).unwrap();

    let digest = format!("sha512:{}", "a".repeat(128));
    let result = client.fetch_blob("alpine", &digest).await;

    assert!(matches!(result.unwrap_err(), LayerError::Validation { .. }));
}

#[tokio::test]
async fn test_fetch_blob_server_error() {
    let mut server = mockito::Server::new_async().await;
    let digest = format!("sha256:{}", "a".repeat(64));
    let mock = server
        .mock("GET", format!("/v2/alpine/blobs/{}", digest).as_str())
        .with_status(503)
        .with_body("service unavailable")
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_blob("alpine", &digest).await;

    mock.assert_async().await;
    assert!(matches!(
        result.unwrap_err(),
        LayerError::Server {
            status_code: 503,
            ..
        }
    ));
}

#[tokio::test]
async fn test_rate_limit_with_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .with_status(429)
        .with_header("Retry-After", "90")
        .with_body("too many requests")
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_manifest("alpine", "latest").await;

    mock.assert_async().await;
    match result.unwrap_err() {
        LayerError::RateLimit {
            message,
            retry_after,
        } => {
            assert!(message.contains("Rate limit exceeded"));
            assert_eq!(retry_after, Some(90));
        }
        other => panic!("Expected RateLimit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_without_challenge_is_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/private/manifests/latest")
        .with_status(401)
        .with_body("authentication required")
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_manifest("private", "latest").await;

    mock.assert_async().await;
    assert!(matches!(
        result.unwrap_err(),
        LayerError::Authentication {
            status_code: Some(401),
            ..
        }
    ));
}

#[tokio::test]
async fn test_bearer_challenge_exchanges_token_and_retries() {
    let mut server = mockito::Server::new_async().await;
    let challenge = format!(
        r#"Bearer realm="{}/token",service="test-registry",scope="repository:alpine:pull""#,
        server.url()
    );

    let unauthorized = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge)
        .create_async()
        .await;
    let token = server
        .mock("GET", "/token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("service".into(), "test-registry".into()),
            Matcher::UrlEncoded("scope".into(), "repository:alpine:pull".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"token":"abc123"}"#)
        .create_async()
        .await;
    let authorized = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", "Bearer abc123")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let (bytes, _) = client.fetch_manifest("alpine", "latest").await.unwrap();

    unauthorized.assert_async().await;
    token.assert_async().await;
    authorized.assert_async().await;
    assert_eq!(bytes, br#"{"schemaVersion":2}"#);
}

#[tokio::test]
async fn test_token_request_sends_basic_credentials() {
    let mut server = mockito::Server::new_async().await;
    let challenge = format!(r#"Bearer realm="{}/token""#, server.url());

    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge)
        .create_async()
        .await;
    let token = server
        .mock("GET", "/token")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_body(r#"{"access_token":"from-access-token"}"#)
        .create_async()
        .await;
    let authorized = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", "Bearer from-access-token")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = Client::new(&server.url())
        .unwrap()
        .with_credentials(Credentials::basic("user", "pass"));
    client.fetch_manifest("alpine", "latest").await.unwrap();

    token.assert_async().await;
    authorized.assert_async().await;
}

#[tokio::test]
async fn test_token_endpoint_rejection_is_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let challenge = format!(r#"Bearer realm="{}/token""#, server.url());

    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge)
        .create_async()
        .await;
    server
        .mock("GET", "/token")
        .with_status(403)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_manifest("alpine", "latest").await;

    assert!(matches!(
        result.unwrap_err(),
        LayerError::Authentication {
            status_code: Some(403),
            ..
        }
    ));
}

#[tokio::test]
async fn test_basic_challenge_retries_with_credentials() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="registry""#)
        .create_async()
        .await;
    let authorized = server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = Client::new(&server.url())
        .unwrap()
        .with_credentials(Credentials::basic("user", "pass"));
    client.fetch_manifest("alpine", "latest").await.unwrap();

    authorized.assert_async().await;
}

#[tokio::test]
async fn test_basic_challenge_without_credentials_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="registry""#)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_manifest("alpine", "latest").await;

    assert!(matches!(
        result.unwrap_err(),
        LayerError::Authentication { .. }
    ));
}

#[tokio::test]
async fn test_token_is_reused_by_clones() {
    let mut server = mockito::Server::new_async().await;
    let challenge = format!(r#"Bearer realm="{}/token""#, server.url());
    let blob = b"layer bytes";
    let digest = sha256_of(blob);

    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge)
        .create_async()
        .await;
    let token = server
        .mock("GET", "/token")
        .with_status(200)
        .with_body(r#"{"token":"shared"}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .match_header("authorization", "Bearer shared")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let blob_mock = server
        .mock("GET", format!("/v2/alpine/blobs/{}", digest).as_str())
        .match_header("authorization", "Bearer shared")
        .with_status(200)
        .with_body(blob)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    client.fetch_manifest("alpine", "latest").await.unwrap();
    let clone = client.clone();
    clone.fetch_blob("alpine", &digest).await.unwrap();

    token.assert_async().await;
    blob_mock.assert_async().await;
}
