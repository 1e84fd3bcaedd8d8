//! Registry credentials and `WWW-Authenticate` challenges.
//!
//! A [`Keychain`] yields the [`Credentials`] for a registry host. When a
//! registry answers 401, the client parses the [`Challenge`] and either
//! presents the credentials directly (Basic) or trades them for a token at
//! the challenge realm (Bearer).

use crate::error::{LayerError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

mod keychain;
pub use keychain::{AnonymousKeychain, DockerConfigKeychain, Keychain};


/// What a keychain knows about a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    /// Username and password (or a personal access token used as one)
    Basic { username: String, password: String },
}

impl Credentials {
    /// # Examples
    ///
    /// ```
    /// use liblayer::auth::Credentials;
    ///
    /// let creds = Credentials::basic("user", "pass");
    /// assert_eq!(creds.basic_header().as_deref(), Some("Basic dXNlcjpwYXNz"));
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// `Authorization` value for a Basic challenge, if there is anything to send.
    pub fn basic_header(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", username, password))
            )),
        }
    }
}

/// A parsed `WWW-Authenticate` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// Token exchange at `realm`, e.g.
    /// `Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/alpine:pull"`
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
    /// Present Basic credentials on the retried request.
    Basic { realm: Option<String> },
}

impl Challenge {
    /// Parses a header value. Scheme names are case-insensitive and quoted
    /// parameter values may contain commas.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown scheme, or a Bearer
    /// challenge without a realm.
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
        let params = parse_params(rest);
        let take = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
        };

        if scheme.eq_ignore_ascii_case("bearer") {
            let realm = take("realm").ok_or_else(|| {
                LayerError::validation("Bearer challenge is missing the 'realm' parameter")
            })?;
            Ok(Self::Bearer {
                realm,
                service: take("service"),
                scope: take("scope"),
            })
        } else if scheme.eq_ignore_ascii_case("basic") {
            Ok(Self::Basic {
                realm: take("realm"),
            })
        } else {
            Err(LayerError::validation(format!(
                "Unsupported authentication scheme '{}'",
                scheme
            )))
        }
    }
}

/// `k1="v1", k2=v2` into key/value pairs.
fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = input.trim_start_matches([' ', ',']);

    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim_end(), &after[end..]),
                None => (after.trim_end(), ""),
            }
        };

        pairs.push((key, value.to_string()));
        rest = remainder.trim_start_matches([' ', ',']);
    }

    pairs
}

/// Body returned by a token endpoint. Docker Hub answers with `token`,
/// other registries with `access_token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or(self.access_token.filter(|t| !t.is_empty()))
    }
}
