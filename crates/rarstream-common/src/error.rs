//! Unified error type for the fetch → extract → resolve pipeline.
//!
//! Every stage funnels its failures into [`Error`], which carries enough
//! context for the HTTP layer to derive a status code via
//! [`Error::http_status`].

/// Error type covering every failure mode of a rarstream request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input (bad or absent URL, unsafe path segment).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote endpoint answered with a non-success status or the
    /// transfer failed part-way.
    #[error("Download failed: {message}")]
    Download {
        /// The URL that was being fetched.
        url: String,
        /// Human-readable error description.
        message: String,
    },

    /// The external decompression tool reported a failure.
    #[error("Extraction failed: {message}")]
    Extraction {
        /// Exit code of the tool, when it exited normally.
        code: Option<i32>,
        /// Human-readable error description.
        message: String,
    },

    /// No qualifying media asset, or a requested path does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Download { .. } => 500,
            Error::Extraction { .. } => 500,
            Error::Io(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Download error.
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new Extraction error.
    pub fn extraction(code: Option<i32>, message: impl Into<String>) -> Self {
        Self::Extraction {
            code,
            message: message.into(),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
