//! Layer selection.
//!
//! Users name layers either by 1-based position or by digest. A digest
//! selector matches a layer's blob digest first and its diff ID second.

use crate::digest::Digest;
use crate::error::{LayerError, Result};
use crate::image::{Image, Layer};
use std::str::FromStr;


/// A parsed layer selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelector {
    /// 1-based position in the image's layer list
    Ordinal(i64),
    /// Blob digest or diff ID
    Digest(Digest),
}

impl FromStr for LayerSelector {
    type Err = LayerError;

    /// Integers become ordinals, anything else must be a valid digest.
    fn from_str(token: &str) -> Result<Self> {
        if let Ok(n) = token.parse::<i64>() {
            return Ok(LayerSelector::Ordinal(n));
        }

        Digest::from_str(token)
            .map(LayerSelector::Digest)
            .map_err(|e| LayerError::InvalidLayerId {
                id: token.to_string(),
                source: Box::new(e),
            })
    }
}

impl LayerSelector {
    /// Finds the selected layer among `layers`.
    ///
    /// # Errors
    ///
    /// - [`LayerError::LayerOutOfRange`] for an ordinal outside `1..=layers.len()`
    /// - [`LayerError::LayerNotFound`] for a digest no layer carries
    pub fn resolve<'a>(&self, layers: &'a [Layer]) -> Result<&'a Layer> {
        match self {
            LayerSelector::Ordinal(n) => usize::try_from(*n)
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| layers.get(i))
                .ok_or(LayerError::LayerOutOfRange { index: *n }),
            LayerSelector::Digest(digest) => layers
                .iter()
                .find(|l| l.digest() == digest)
                .or_else(|| layers.iter().find(|l| l.diff_id_opt() == Some(digest)))
                .ok_or_else(|| LayerError::LayerNotFound {
                    id: digest.to_string(),
                }),
        }
    }
}

/// Resolves `tokens` against the image's layers.
///
/// With no tokens every layer is returned in image order. Otherwise one
/// layer is returned per token, in token order; repeated tokens select the
/// same layer again.
///
/// # Examples
///
/// ```
/// use liblayer::image::{Image, ImageSource, Layer};
/// use liblayer::select_layers;
///
/// let layer = Layer::from_bytes(b"blob".to_vec(), None).unwrap();
/// let image = Image::new("demo", ImageSource::Archive, vec![layer]);
///
/// assert_eq!(select_layers::<&str>(&image, &[]).unwrap().len(), 1);
/// assert_eq!(select_layers(&image, &["1", "1"]).unwrap().len(), 2);
/// assert_eq!(
///     select_layers(&image, &["2"]).unwrap_err().to_string(),
///     "layer 2 does not exist"
/// );
/// ```
pub fn select_layers<'a, S: AsRef<str>>(image: &'a Image, tokens: &[S]) -> Result<Vec<&'a Layer>> {
    let layers = image.layers();
    if tokens.is_empty() {
        return Ok(layers.iter().collect());
    }

    tokens
        .iter()
        .map(|token| LayerSelector::from_str(token.as_ref())?.resolve(layers))
        .collect()
}
