//! Path utilities for recognising media files and archive names.
//!
//! These checks are purely extension based. Media content is never opened
//! or inspected.

use std::path::{Component, Path};

/// Extensions (lowercase) of files that may be exposed for playback.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi"];

/// Extension (lowercase, without dot) of the archives this service accepts.
pub const ARCHIVE_EXTENSION: &str = "rar";

/// Check if a path has a recognised media extension (case-insensitive).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use rarstream_common::paths::is_media_file;
///
/// assert!(is_media_file(Path::new("episode1.mp4")));
/// assert!(is_media_file(Path::new("/x/Movie.MKV")));
/// assert!(!is_media_file(Path::new("readme.txt")));
/// ```
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a file name or URL path ends in the archive extension.
///
/// # Examples
///
/// ```
/// use rarstream_common::paths::has_archive_extension;
///
/// assert!(has_archive_extension("/downloads/show.rar"));
/// assert!(has_archive_extension("SHOW.RAR"));
/// assert!(!has_archive_extension("/downloads/show.zip"));
/// assert!(!has_archive_extension("rar"));
/// ```
pub fn has_archive_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        .unwrap_or(false)
}

/// Strip the archive extension from a file name, if present.
pub fn strip_archive_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION) => stem,
        _ => name,
    }
}

/// Guess the MIME type from a file's extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Check that `segment` is exactly one normal path component.
///
/// Rejects empty strings, `.`/`..`, separators, and absolute paths so that
/// joining the segment onto a root can never escape that root.
pub fn is_safe_component(segment: &str) -> bool {
    if segment.is_empty() || segment.contains('/') || segment.contains('\\') {
        return false;
    }

    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
