use super::archive::ArchiveFile;
use crate::client::Client;
use crate::digest::Digest;
use crate::error::{LayerError, Result};
use std::io::{BufRead, BufReader, Cursor, Read};
use std::sync::Arc;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Media type given to layers built from raw bytes.
const TAR_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar";

/// Where a layer's compressed blob lives.
#[derive(Debug, Clone)]
pub(crate) enum BlobSource {
    /// A member of a tarball on disk.
    Archive {
        archive: Arc<ArchiveFile>,
        member: String,
    },
    /// A blob in a registry repository.
    Registry { client: Client, repository: String },
    /// Bytes already in memory.
    Memory(Arc<Vec<u8>>),
}

/// One filesystem layer of an image.
///
/// `digest` and `size` describe the blob as stored (usually compressed);
/// `diff_id` is the digest of the uncompressed tar stream and comes from the
/// image config.
#[derive(Debug, Clone)]
pub struct Layer {
    digest: Digest,
    diff_id: Option<Digest>,
    size: u64,
    media_type: String,
    source: BlobSource,
}

enum Compression {
    Gzip,
    Zstd,
    None,
}

impl Layer {
    pub(crate) fn new(
        digest: Digest,
        diff_id: Option<Digest>,
        size: u64,
        media_type: String,
        source: BlobSource,
    ) -> Self {
        Self {
            digest,
            diff_id,
            size,
            media_type,
            source,
        }
    }

    /// Creates a layer from an in-memory blob.
    ///
    /// The digest and size are computed from `blob`, which may be a plain or
    /// compressed tar stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use liblayer::image::Layer;
    ///
    /// let layer = Layer::from_bytes(b"not really a tar".to_vec(), None).unwrap();
    /// assert_eq!(layer.size(), 16);
    /// assert!(layer.diff_id().is_err());
    /// ```
    pub fn from_bytes(blob: Vec<u8>, diff_id: Option<Digest>) -> Result<Self> {
        let digest = Digest::sha256(&blob)?;
        Ok(Self::new(
            digest,
            diff_id,
            blob.len() as u64,
            TAR_MEDIA_TYPE.to_string(),
            BlobSource::Memory(Arc::new(blob)),
        ))
    }

    /// Digest of the stored blob.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Digest of the uncompressed content.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the image config recorded no diff ID
    /// for this layer.
    pub fn diff_id(&self) -> Result<&Digest> {
        self.diff_id.as_ref().ok_or_else(|| {
            LayerError::validation(format!("no diff ID recorded for layer {}", self.digest))
        })
    }

    pub(crate) fn diff_id_opt(&self) -> Option<&Digest> {
        self.diff_id.as_ref()
    }

    /// Size of the stored blob in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Opens the layer's uncompressed tar stream.
    ///
    /// Registry blobs are downloaded and verified first; archive members are
    /// copied to an anonymous temp file. gzip and zstd compression are
    /// detected from the first bytes of the blob, anything else is read as is.
    /// The returned reader owns everything it needs, so dropping it releases
    /// the stream.
    pub async fn uncompressed(&self) -> Result<Box<dyn Read + Send>> {
        let raw: Box<dyn Read + Send> = match &self.source {
            BlobSource::Archive { archive, member } => Box::new(archive.spool_member(member)?),
            BlobSource::Registry { client, repository } => {
                let bytes = client
                    .fetch_blob(repository, &self.digest.to_string())
                    .await?;
                Box::new(Cursor::new(bytes))
            }
            BlobSource::Memory(bytes) => Box::new(Cursor::new(bytes.as_ref().clone())),
        };

        decompress(raw)
    }
}

fn decompress(raw: Box<dyn Read + Send>) -> Result<Box<dyn Read + Send>> {
    let mut reader = BufReader::new(raw);
    let head = reader
        .fill_buf()
        .map_err(|e| LayerError::io("reading layer blob", e))?;

    let compression = if head.starts_with(&GZIP_MAGIC) {
        Compression::Gzip
    } else if head.starts_with(&ZSTD_MAGIC) {
        Compression::Zstd
    } else {
        Compression::None
    };

    match compression {
        Compression::Gzip => {
            tracing::trace!("layer blob is gzip compressed");
            Ok(Box::new(flate2::bufread::MultiGzDecoder::new(reader)))
        }
        Compression::Zstd => {
            tracing::trace!("layer blob is zstd compressed");
            let decoder = zstd::stream::read::Decoder::with_buffer(reader)
                .map_err(|e| LayerError::io("initializing zstd decoder", e))?;
            Ok(Box::new(decoder))
        }
        Compression::None => Ok(Box::new(reader)),
    }
}

#[cfg(test)]
#[path = "layer_tests.rs"]
mod tests;
