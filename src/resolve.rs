//! Media discovery inside an extraction directory.

use std::path::Path;

use rarstream_common::paths::{content_type_for, is_media_file};
use rarstream_common::{Error, ExtractedAsset, Result};

/// Selects the media file to expose from an extraction directory.
///
/// Only direct children are considered. Candidates are ordered by file name
/// so the same archive always yields the same asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentResolver;

impl ContentResolver {
    pub fn new() -> Self {
        Self
    }

    /// List every recognised media file directly under `dir`, sorted by name.
    ///
    /// Directories, symlinks, and names that are not valid UTF-8 are skipped.
    pub async fn candidates(&self, dir: &Path) -> Result<Vec<ExtractedAsset>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut assets = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_media_file(&path) {
                continue;
            }

            if !entry.file_type().await?.is_file() {
                tracing::debug!(path = %path.display(), "Skipping non-regular media entry");
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::debug!(path = %path.display(), "Skipping non UTF-8 file name");
                continue;
            };

            assets.push(ExtractedAsset {
                media_type: content_type_for(&path),
                absolute_path: path,
                relative_name: name,
            });
        }

        assets.sort_by(|a, b| a.relative_name.cmp(&b.relative_name));
        Ok(assets)
    }

    /// Pick the media asset to stream from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no recognised media file exists.
    pub async fn resolve(&self, dir: &Path) -> Result<ExtractedAsset> {
        let mut candidates = self.candidates(dir).await?;
        if candidates.len() > 1 {
            tracing::debug!(
                dir = %dir.display(),
                count = candidates.len(),
                "Multiple media files found, selecting the first by name"
            );
        }

        if candidates.is_empty() {
            return Err(Error::not_found("No video files found in archive."));
        }
        Ok(candidates.swap_remove(0))
    }
}
