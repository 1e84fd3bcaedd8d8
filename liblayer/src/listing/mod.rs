//! File listings of layer tar streams.
//!
//! A layer's uncompressed stream is walked header by header. Decode failures
//! are reported as [`LayerError::Archive`]; only a clean end of archive ends
//! the walk.

use crate::digest::Digest;
use crate::error::{LayerError, Result, ResultExt};
use crate::format::{EntryKind, format_mode, format_size};
use crate::image::Layer;
use serde::Serialize;
use std::cmp::Ordering;
use std::io::Read;


/// One member of a layer archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Full path inside the layer
    pub name: String,
    /// Size in bytes as recorded in the header
    pub size: u64,
    /// Permission bits, including setuid/setgid/sticky
    pub mode: u32,
    pub kind: EntryKind,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// `ls -l` style mode string, e.g. `-rw-r--r--`.
    pub fn mode_string(&self) -> String {
        format_mode(self.mode, self.kind)
    }

    pub fn size_display(&self) -> String {
        format_size(self.size)
    }
}

/// The listed files of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerListing {
    /// Section label: the layer's uncompressed-content digest
    pub diff_id: Digest,
    /// Non-directory entries, in archive order or sorted
    pub entries: Vec<FileEntry>,
}

fn entry_kind(entry_type: tar::EntryType) -> EntryKind {
    match entry_type {
        tar::EntryType::Regular | tar::EntryType::Continuous => EntryKind::Regular,
        tar::EntryType::Link => EntryKind::HardLink,
        tar::EntryType::Symlink => EntryKind::Symlink,
        tar::EntryType::Char => EntryKind::CharDevice,
        tar::EntryType::Block => EntryKind::BlockDevice,
        tar::EntryType::Fifo => EntryKind::Fifo,
        tar::EntryType::Directory => EntryKind::Directory,
        _ => EntryKind::Other,
    }
}

/// Reads every header of the tar stream `reader`, in archive order.
///
/// Directories are included. The reader is consumed and dropped before
/// this returns.
///
/// # Errors
///
/// Returns [`LayerError::Archive`] when a header or path cannot be decoded.
pub fn read_entries<R: Read>(reader: R) -> Result<Vec<FileEntry>> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| LayerError::archive("opening tar stream", e))?;

    let mut files = Vec::new();
    for (i, entry) in entries.enumerate() {
        let entry = entry.map_err(|e| LayerError::archive(format!("entry {}", i + 1), e))?;
        let name = entry
            .path()
            .map_err(|e| LayerError::archive(format!("path of entry {}", i + 1), e))?
            .to_string_lossy()
            .into_owned();
        let mode = entry
            .header()
            .mode()
            .map_err(|e| LayerError::archive(format!("mode of {}", name), e))?;

        files.push(FileEntry {
            size: entry.size(),
            mode,
            kind: entry_kind(entry.header().entry_type()),
            name,
        });
    }

    tracing::trace!(entries = files.len(), "read tar headers");
    Ok(files)
}

/// Orders entries by size, largest first, then by name.
///
/// Names compare byte-wise, so uppercase sorts before lowercase.
///
/// # Examples
///
/// ```
/// use liblayer::format::EntryKind;
/// use liblayer::listing::{FileEntry, sort_entries};
///
/// let file = |name: &str, size| FileEntry {
///     name: name.to_string(),
///     size,
///     mode: 0o644,
///     kind: EntryKind::Regular,
/// };
/// let mut entries = vec![file("a", 10), file("c", 100), file("b", 100)];
/// sort_entries(&mut entries);
///
/// let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
/// assert_eq!(names, ["b", "c", "a"]);
/// ```
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(compare_entries);
}

fn compare_entries(a: &FileEntry, b: &FileEntry) -> Ordering {
    b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name))
}

/// Lists the files of one layer.
///
/// The layer stream is opened, read to the end and released before this
/// returns, on success and failure alike. Directory entries are dropped.
///
/// # Errors
///
/// - `getting layer diffid: ...` when the layer has no diff ID
/// - `getting layer: ...` when the stream cannot be opened
/// - [`LayerError::Archive`] when the stream is not a valid tar archive
pub async fn list_layer(layer: &Layer, sort: bool) -> Result<LayerListing> {
    let diff_id = layer.diff_id().context("getting layer diffid")?.clone();

    let entries = {
        let reader = layer.uncompressed().await.context("getting layer")?;
        read_entries(reader)?
    };

    let mut entries: Vec<FileEntry> = entries.into_iter().filter(|e| !e.is_dir()).collect();
    if sort {
        sort_entries(&mut entries);
    }

    tracing::debug!(%diff_id, files = entries.len(), sort, "listed layer");
    Ok(LayerListing { diff_id, entries })
}
