//! Core types shared between the retrieval pipeline and the HTTP layer.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::is_safe_component;

/// Characters escaped when a file name is placed in a URL path segment.
///
/// Matches the unreserved set browsers leave alone in `encodeURIComponent`.
const FILE_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A single fetch request in flight.
///
/// Lives only for the duration of one `/fetch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    /// Remote archive location.
    pub source_url: String,
    /// Where the archive bytes are written.
    pub download_path: PathBuf,
    /// Directory the archive is extracted into.
    pub extraction_dir: PathBuf,
}

impl ArchiveJob {
    /// Name of the extraction directory, used as the first stream segment.
    pub fn extraction_dir_name(&self) -> Option<&str> {
        self.extraction_dir.file_name().and_then(|n| n.to_str())
    }
}

/// A media file discovered inside an extraction directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAsset {
    /// Absolute path of the file on disk.
    pub absolute_path: PathBuf,
    /// File name relative to the extraction directory.
    pub relative_name: String,
    /// MIME type inferred from the extension.
    pub media_type: String,
}

/// The externally visible `(directory, file)` pair addressing an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamReference {
    /// Extraction directory name (a direct child of the extraction root).
    pub folder: String,
    /// File name inside that directory.
    pub file_name: String,
}

impl StreamReference {
    /// Create a reference from its two segments.
    pub fn new(folder: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            file_name: file_name.into(),
        }
    }

    /// Build the reference for an asset selected from `job`.
    pub fn for_asset(job: &ArchiveJob, asset: &ExtractedAsset) -> Result<Self> {
        let folder = job
            .extraction_dir_name()
            .ok_or_else(|| Error::internal("extraction directory has no usable name"))?;
        Ok(Self::new(folder, asset.relative_name.clone()))
    }

    /// The `/stream/<folder>/<file>` path handed back to clients.
    ///
    /// Both segments are percent-encoded, so names with spaces or `#` stay
    /// a single path segment each.
    pub fn stream_path(&self) -> String {
        format!(
            "/stream/{}/{}",
            utf8_percent_encode(&self.folder, FILE_NAME_ENCODE_SET),
            utf8_percent_encode(&self.file_name, FILE_NAME_ENCODE_SET)
        )
    }

    /// Resolve the reference to a path under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either segment is not a single
    /// normal path component, so the result can never escape `root`.
    pub fn resolve(&self, root: &Path) -> Result<PathBuf> {
        if !is_safe_component(&self.folder) || !is_safe_component(&self.file_name) {
            return Err(Error::validation(format!(
                "invalid stream reference: {}/{}",
                self.folder, self.file_name
            )));
        }
        Ok(root.join(&self.folder).join(&self.file_name))
    }
}
