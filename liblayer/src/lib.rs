//! Layer - Container Image Layer Inspection Library
//!
//! liblayer resolves container images from tarballs, the local image daemon
//! or remote registries, and reports on their filesystem layers.
//!
//! # Quick Start
//!
//! ```no_run
//! use liblayer::Inspector;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inspector = Inspector::new();
//!
//!     // Per-layer diff IDs and sizes
//!     let report = inspector.inspect("alpine:latest").await?;
//!     for row in &report.layers {
//!         println!("{}  {}  {}", row.index, row.diff_id, row.size_display);
//!     }
//!
//!     // Files in every layer, in archive order
//!     for listing in inspector.list::<&str>("alpine:latest", &[], false).await? {
//!         println!("--- {} ---", listing.diff_id);
//!         for entry in &listing.entries {
//!             println!("{}  {}  {}", entry.mode_string(), entry.size_display(), entry.name);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Three sources**: `docker save` / OCI layout tarballs, the local daemon
//!   (`docker` or `podman`), and OCI registries, tried in that order
//! - **Layer selection**: by 1-based position, blob digest, or diff ID
//! - **Compression**: gzip, zstd and plain tar layers
//! - **Authentication**: Bearer token exchange and Basic auth, with
//!   credentials from a docker `config.json`
//!
//! # Main Types
//!
//! - [`Inspector`] - Main entry point
//! - [`InspectorBuilder`] - Builder for advanced configuration
//! - [`Image`] and [`Layer`] - A resolved image and its layers
//! - [`LayerReport`] - Output of `inspect`
//! - [`LayerListing`] and [`FileEntry`] - Output of `list`
//! - [`LayerError`] - Error type for every operation

#![warn(clippy::all)]

/// Returns the liblayer crate version.
///
/// This is useful for version reporting in CLI tools and debugging.
///
/// # Examples
///
/// ```
/// let version = liblayer::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
mod inspector;
pub use inspector::{Inspector, InspectorBuilder};

// Re-export commonly used types for convenience
pub use auth::{Credentials, DockerConfigKeychain, Keychain};
pub use config::Config;
pub use digest::Digest;
pub use error::{LayerError, Result};
pub use image::{Image, ImageSource, Layer, Resolver, ResolverChain};
pub use listing::{FileEntry, LayerListing, list_layer, read_entries, sort_entries};
pub use reference::Reference;
pub use report::{LayerReport, LayerRow, build_report};
pub use select::{LayerSelector, select_layers};

pub mod image;
pub mod listing;
pub mod report;
pub mod select;

// Low-level implementation modules (hidden from docs but still public)
#[doc(hidden)]
pub mod auth;
#[doc(hidden)]
pub mod client;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod digest;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod format;
#[doc(hidden)]
pub mod oci;
#[doc(hidden)]
pub mod reference;

#[cfg(test)]
mod testutil;
