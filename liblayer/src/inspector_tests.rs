use super::*;
use crate::auth::AnonymousKeychain;
use crate::error::LayerError;
use crate::image::{Image, ImageSource, Layer};
use crate::testutil::{Member, docker_save, gzip, tar_bytes};
use async_trait::async_trait;
use tempfile::TempDir;

/// Serves one fixed image for every reference.
struct Canned(Image);

#[async_trait]
impl Resolver for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn resolve(&self, _reference: &str) -> Result<Image> {
        Ok(self.0.clone())
    }
}

fn canned_layer(members: &[Member<'_>]) -> Layer {
    let tar = tar_bytes(members);
    let diff_id = crate::digest::Digest::sha256(&tar).unwrap();
    Layer::from_bytes(gzip(&tar), Some(diff_id)).unwrap()
}

fn canned(layers: Vec<Layer>) -> Inspector {
    let image = Image::new("canned", ImageSource::Registry, layers);
    Inspector::builder()
        .resolvers(vec![Box::new(Canned(image))])
        .build()
}

#[test]
fn test_default_resolver_order() {
    let inspector = Inspector::builder()
        .keychain(Arc::new(AnonymousKeychain))
        .build();

    assert_eq!(inspector.resolvers(), vec!["archive", "daemon", "registry"]);
}

#[test]
fn test_daemon_can_be_disabled() {
    let mut config = Config::default();
    config.daemon.enabled = false;

    let inspector = Inspector::builder().config(config).build();

    assert_eq!(inspector.resolvers(), vec!["archive", "registry"]);
}

#[test]
fn test_custom_resolvers_replace_chain() {
    let inspector = canned(Vec::new());

    assert_eq!(inspector.resolvers(), vec!["canned"]);
}

#[tokio::test]
async fn test_open_empty_reference() {
    let inspector = canned(Vec::new());

    let err = inspector.open("").await.unwrap_err();

    assert_eq!(err.to_string(), r#"unable to find image """#);
}

#[tokio::test]
async fn test_inspect_reports_every_layer() {
    let inspector = canned(vec![
        canned_layer(&[Member::File("a", b"1", 0o644)]),
        canned_layer(&[Member::File("b", b"2", 0o644)]),
    ]);

    let report = inspector.inspect("anything").await.unwrap();

    assert_eq!(report.reference, "canned");
    assert_eq!(report.layers.len(), 2);
    assert_eq!(report.layers[1].index, 2);
}

#[tokio::test]
async fn test_list_selected_layers_in_token_order() {
    let inspector = canned(vec![
        canned_layer(&[Member::File("first", b"1", 0o644)]),
        canned_layer(&[Member::File("second", b"22", 0o644)]),
    ]);

    let listings = inspector.list("x", &["2", "1"], false).await.unwrap();

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].entries[0].name, "second");
    assert_eq!(listings[1].entries[0].name, "first");
}

#[tokio::test]
async fn test_list_stops_at_selector_error() {
    let inspector = canned(vec![canned_layer(&[Member::File("a", b"1", 0o644)])]);

    let err = inspector.list("x", &["2"], false).await.unwrap_err();

    assert_eq!(err.to_string(), "layer 2 does not exist");
}

#[tokio::test]
async fn test_list_stops_at_first_failing_layer() {
    let good = canned_layer(&[Member::File("a", b"1", 0o644)]);
    let no_diff_id = Layer::from_bytes(tar_bytes(&[Member::File("b", b"2", 0o644)]), None).unwrap();
    let inspector = canned(vec![no_diff_id, good]);

    let err = inspector.list::<&str>("x", &[], false).await.unwrap_err();

    assert!(matches!(
        err,
        LayerError::Context {
            context: "getting layer diffid",
            ..
        }
    ));
}

#[tokio::test]
async fn test_platform_override_reaches_archive_resolver() {
    let dir = TempDir::new().unwrap();
    let path = docker_save(
        dir.path(),
        &[tar_bytes(&[Member::File("f", b"x", 0o644)])],
        true,
    );
    let mut config = Config::default();
    config.daemon.enabled = false;
    let inspector = Inspector::builder()
        .config(config)
        .platform(TargetPlatform {
            os: "linux".to_string(),
            architecture: "arm64".to_string(),
            variant: None,
        })
        .keychain(Arc::new(AnonymousKeychain))
        .build();

    // docker save layout carries no platform, so any target reads it
    let report = inspector.inspect(&path.to_string_lossy()).await.unwrap();

    assert_eq!(report.layers.len(), 1);
}
