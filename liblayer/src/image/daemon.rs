use super::archive::read_archive_with_guard;
use super::{Image, ImageSource, Resolver};
use crate::error::{LayerError, Result};
use crate::oci::TargetPlatform;
use crate::reference::Reference;
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;

/// Resolves references against the local image daemon.
///
/// The image is exported with `<command> image save <ref>` into a temp file
/// which is then read like any other `docker save` tarball. The temp file is
/// removed when the last layer of the resulting image is dropped.
#[derive(Debug, Clone)]
pub struct DaemonResolver {
    command: String,
    platform: TargetPlatform,
}

impl DaemonResolver {
    /// Creates a resolver that exports images through `command` (`docker`, `podman`).
    pub fn new(command: impl Into<String>, platform: TargetPlatform) -> Self {
        Self {
            command: command.into(),
            platform,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Resolver for DaemonResolver {
    fn name(&self) -> &'static str {
        "daemon"
    }

    async fn resolve(&self, reference: &str) -> Result<Image> {
        Reference::from_str(reference)?;

        let temp = tempfile::Builder::new()
            .prefix("layer-save-")
            .suffix(".tar")
            .tempfile()
            .map_err(|e| LayerError::io("creating temp file for image export", e))?;
        let (file, temp_path) = temp.into_parts();

        tracing::debug!(command = %self.command, %reference, path = %temp_path.display(), "exporting image from daemon");

        // `output()` would re-pipe stdout, so spawn and collect stderr only.
        let child = Command::new(&self.command)
            .args(["image", "save", reference])
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LayerError::io(format!("running {}", self.command), e))?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| LayerError::io(format!("waiting for {}", self.command), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(LayerError::io(
                format!("{} image save {} failed ({})", self.command, reference, output.status),
                io::Error::other(stderr),
            ));
        }

        let path = temp_path.to_path_buf();
        read_archive_with_guard(
            &path,
            reference,
            ImageSource::Daemon,
            &self.platform,
            Some(temp_path),
        )
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
