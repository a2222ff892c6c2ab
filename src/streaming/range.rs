//! HTTP `Range` header parsing.

/// Outcome of interpreting a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve bytes `start..=end`.
    Satisfiable { start: u64, end: u64 },
    /// The range cannot be served for this file; answer 416.
    Unsatisfiable,
}

impl ByteRange {
    /// Number of bytes the range covers.
    pub fn len(&self) -> u64 {
        match self {
            ByteRange::Satisfiable { start, end } => end - start + 1,
            ByteRange::Unsatisfiable => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a `Range` header value.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500- (to end of file)
/// - bytes=-500 (last 500 bytes)
///
/// Only the first range of a multi-range request is honoured. An end past
/// the file is clamped to the last byte. A start at or past the end of the
/// file, or an end before the start, is [`ByteRange::Unsatisfiable`].
///
/// Returns `None` when the header is not a byte-range specification at all;
/// callers then ignore it and serve the whole file.
pub fn parse_range_header(header: &str, file_size: u64) -> Option<ByteRange> {
    let spec = header.trim().strip_prefix("bytes=")?;
    let first = spec.split(',').next()?.trim();
    let (start, end) = first.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let suffix_len: u64 = end.parse().ok()?;
            if suffix_len == 0 || file_size == 0 {
                return Some(ByteRange::Unsatisfiable);
            }
            Some(ByteRange::Satisfiable {
                start: file_size.saturating_sub(suffix_len),
                end: file_size - 1,
            })
        }
        // bytes=500- (from 500 to end)
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            if start >= file_size {
                return Some(ByteRange::Unsatisfiable);
            }
            Some(ByteRange::Satisfiable {
                start,
                end: file_size - 1,
            })
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start >= file_size || start > end {
                return Some(ByteRange::Unsatisfiable);
            }
            Some(ByteRange::Satisfiable {
                start,
                end: end.min(file_size - 1),
            })
        }
        // bytes=- (invalid)
        (true, true) => None,
    }
}
