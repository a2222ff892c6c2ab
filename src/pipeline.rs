//! The fetch → extract → resolve retrieval pipeline.
//!
//! A [`FetchPipeline`] owns the three stages plus the two storage roots.
//! Each call to [`FetchPipeline::run`] plans a fresh [`ArchiveJob`], runs the
//! stages strictly in order, and short-circuits on the first failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use rarstream_common::paths::{has_archive_extension, is_safe_component, strip_archive_extension};
use rarstream_common::{ArchiveJob, Error, ExtractedAsset, Result, StreamReference};
use reqwest::Url;

use crate::config::Config;
use crate::extract::{ExtractionService, UnrarExtractor};
use crate::fetch::Fetcher;
use crate::resolve::ContentResolver;

/// Attempts at finding an unused `<millis>-<name>` before giving up.
const MAX_NAME_ATTEMPTS: i64 = 64;

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub job: ArchiveJob,
    pub asset: ExtractedAsset,
    pub reference: StreamReference,
}

/// Runs archive retrieval requests against a download and extraction root.
pub struct FetchPipeline {
    fetcher: Fetcher,
    extractor: Arc<dyn ExtractionService>,
    resolver: ContentResolver,
    download_dir: PathBuf,
    extract_dir: PathBuf,
}

impl FetchPipeline {
    pub fn new(
        fetcher: Fetcher,
        extractor: Arc<dyn ExtractionService>,
        download_dir: impl Into<PathBuf>,
        extract_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            resolver: ContentResolver::new(),
            download_dir: download_dir.into(),
            extract_dir: extract_dir.into(),
        }
    }

    /// Build the production pipeline (reqwest fetcher, unrar extractor).
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Fetcher::new(&config.fetch),
            Arc::new(UnrarExtractor::from_config(&config.tools)),
            config.storage.download_dir.clone(),
            config.storage.extract_dir.clone(),
        )
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Create both storage roots if they do not exist yet.
    pub async fn prepare_roots(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        tokio::fs::create_dir_all(&self.extract_dir).await?;
        Ok(())
    }

    /// Retrieve the archive at `raw_url` and select the media file to stream.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a missing or unacceptable URL; nothing is
    ///   downloaded.
    /// - [`Error::Download`] when the transfer fails (no archive is left).
    /// - [`Error::Extraction`] when the extractor fails (partial output is
    ///   left in place).
    /// - [`Error::NotFound`] when the archive holds no recognised media file.
    pub async fn run(&self, raw_url: &str) -> Result<FetchOutcome> {
        let url = validate_url(raw_url)?;
        let job = self.plan_job(&url).await?;

        tracing::info!(
            url = %url,
            download = %job.download_path.display(),
            extraction = %job.extraction_dir.display(),
            "Starting fetch job"
        );

        self.fetcher.fetch(&url, &job.download_path).await?;
        self.extractor
            .extract(&job.download_path, &job.extraction_dir)
            .await?;
        let asset = self.resolver.resolve(&job.extraction_dir).await?;
        let reference = StreamReference::for_asset(&job, &asset)?;

        tracing::info!(
            url = %url,
            asset = %asset.relative_name,
            stream_path = %reference.stream_path(),
            "Fetch job complete"
        );

        Ok(FetchOutcome {
            job,
            asset,
            reference,
        })
    }

    /// Allocate the paths for a new job.
    ///
    /// The download file is created empty with create-new semantics so two
    /// concurrent jobs can never share a name; on a clash the timestamp is
    /// bumped by one millisecond.
    async fn plan_job(&self, url: &Url) -> Result<ArchiveJob> {
        let basename = archive_basename(url)?;
        let stem = strip_archive_extension(&basename);
        let start = chrono::Utc::now().timestamp_millis();

        for millis in start..start + MAX_NAME_ATTEMPTS {
            let download_path = self.download_dir.join(format!("{millis}-{basename}"));
            let extraction_dir = self.extract_dir.join(format!("{millis}-{stem}"));

            if tokio::fs::try_exists(&extraction_dir).await? {
                continue;
            }

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&download_path)
                .await
            {
                Ok(_) => {
                    return Ok(ArchiveJob {
                        source_url: url.to_string(),
                        download_path,
                        extraction_dir,
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::internal(format!(
            "no free job name for {basename} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }
}

/// Parse and check a client-supplied archive URL.
///
/// The URL must be `http`/`https` and its path must end in `.rar`
/// (case-insensitive); the query string is not considered.
pub fn validate_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation("missing URL"));
    }

    let url = Url::parse(raw).map_err(|e| Error::validation(format!("invalid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(format!(
            "unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    if !has_archive_extension(url.path()) {
        return Err(Error::validation(format!(
            "URL does not point to a .rar archive: {}",
            url.path()
        )));
    }

    Ok(url)
}

/// The decoded last path segment of `url`, usable as a file name.
pub fn archive_basename(url: &Url) -> Result<String> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| Error::validation("archive name is not valid UTF-8"))?;

    if !is_safe_component(&decoded) || !has_archive_extension(&decoded) {
        return Err(Error::validation(format!(
            "unusable archive name: {segment}"
        )));
    }

    Ok(decoded.into_owned())
}
