//! Remote archive download.
//!
//! Streams a remote resource into a local file chunk by chunk so memory use
//! stays bounded regardless of archive size. Any failure removes the
//! destination file before the error is returned.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use rarstream_common::{Error, Result};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::FetchConfig;

/// Downloads archives over HTTP(S).
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Self {
        // Redirects are not followed: a 3xx is a failed download like any
        // other non-200 status.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::builder().redirect(Policy::none()).build()
            })
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client without redirects: {}", e);
                Client::new()
            });

        Self { client }
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// `dest` may already exist as an empty placeholder; it is truncated.
    /// Only a `200 OK` response is accepted and no retry is attempted.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the scheme is not `http` or `https`.
    /// - [`Error::Download`] for a non-200 status, a transport failure, or a
    ///   local write failure. `dest` never survives an error.
    pub async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64> {
        match self.download_to(url, dest).await {
            Ok(written) => {
                tracing::info!(url = %url, path = %dest.display(), bytes = written, "Download complete");
                Ok(written)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %dest.display(), "Failed to remove partial download: {rm}");
                    }
                }
                Err(e)
            }
        }
    }

    async fn download_to(&self, url: &Url, dest: &Path) -> Result<u64> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        tracing::debug!(url = %url, "Starting download");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::download(url.as_str(), e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(url = %url, status = status.as_u16(), "Remote returned non-success status");
            return Err(Error::download(url.as_str(), status.as_u16().to_string()));
        }

        let write_err = |e: std::io::Error| {
            Error::download(url.as_str(), format!("failed to write {}: {e}", dest.display()))
        };

        let file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        let mut written: u64 = 0;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::download(url.as_str(), e.to_string()))?;
            writer.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }

        writer.flush().await.map_err(write_err)?;
        writer.into_inner().sync_all().await.map_err(write_err)?;

        Ok(written)
    }
}
