//! Error types for liblayer
//!
//! Every fallible operation in the library returns [`LayerError`]. Variants
//! fall into four groups: reference resolution (`ImageNotFound`), layer
//! selection (`LayerOutOfRange`, `InvalidLayerId`, `LayerNotFound`), stream
//! and archive decoding (`Io`, `Archive`, `Context`), and the registry
//! transport errors inherited from the HTTP client.

use thiserror::Error;


type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for layer operations
#[derive(Error, Debug)]
pub enum LayerError {
    /// Network-related errors (connection, timeout, DNS)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Authentication errors (401, 403, token issues)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Resource not found errors (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Rate limiting errors (429)
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Server errors (500, 503)
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Validation errors (invalid manifest, digest mismatch, etc.)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Local I/O failures (opening archives, spooling blobs, spawning the daemon CLI)
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A layer's tar stream could not be decoded.
    #[error("reading layer archive: {message}")]
    Archive {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// None of the resolvers could produce an image for the reference.
    #[error("unable to find image {reference:?}")]
    ImageNotFound { reference: String },

    /// An ordinal layer selector fell outside `1..=N`.
    #[error("layer {index} does not exist")]
    LayerOutOfRange { index: i64 },

    /// A non-numeric layer selector is not a well-formed digest.
    #[error("invalid layer id {id}: {source}")]
    InvalidLayerId {
        id: String,
        #[source]
        source: Box<LayerError>,
    },

    /// A digest selector matched neither a layer digest nor a diff ID.
    #[error("layer {id} not found")]
    LayerNotFound { id: String },

    /// Another error prefixed with a short static description of the step that failed.
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<LayerError>,
    },
}

/// Result type alias for layer operations
pub type Result<T> = std::result::Result<T, LayerError>;

impl LayerError {
    /// Transport failure without an underlying error value.
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Rejected credentials or a failed token exchange.
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// 429, with the `Retry-After` seconds when the registry sent them.
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Malformed input: manifests, digests, references, platform strings.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::error::LayerError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    /// let err = LayerError::config_with_source("failed to read config", Some("/etc/layer.yaml"), io_err);
    /// assert!(matches!(err, LayerError::Config { .. }));
    /// ```
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new I/O error.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::error::LayerError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
    /// let err = LayerError::io("opening image.tar", io_err);
    /// assert_eq!(err.to_string(), "opening image.tar: no such file");
    /// ```
    pub fn io<S: Into<String>>(message: S, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new archive decode error.
    pub fn archive<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Archive {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an error for a reference no resolver could find.
    pub fn image_not_found<S: Into<String>>(reference: S) -> Self {
        Self::ImageNotFound {
            reference: reference.into(),
        }
    }

    /// Wraps this error with a short description of the failing step.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::error::LayerError;
    ///
    /// let err = LayerError::validation("no diff ID").context("getting layer diffid");
    /// assert_eq!(err.to_string(), "getting layer diffid: Validation error: no diff ID");
    /// ```
    pub fn context(self, context: &'static str) -> Self {
        Self::Context {
            context,
            source: Box::new(self),
        }
    }
}

/// Extension for attaching a step description to a `Result`.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with `context`.
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| e.context(context))
    }
}

impl From<config::ConfigError> for LayerError {
    fn from(err: config::ConfigError) -> Self {
        LayerError::config_with_source("Failed to load configuration", None, err)
    }
}
