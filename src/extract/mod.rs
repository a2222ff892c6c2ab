//! Archive extraction.
//!
//! Decompression is delegated to an external capability behind the
//! [`ExtractionService`] trait. [`UnrarExtractor`] is the production backend
//! and spawns the `unrar` binary; tests substitute fakes.

mod tools;

pub use tools::{check_tool, get_tool_path, ToolInfo};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use rarstream_common::{Error, Result};
use tokio::process::Command;

use crate::config::ToolsConfig;

/// Name of the decompression binary.
pub const UNRAR: &str = "unrar";

/// Populates a directory with the contents of an archive.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Extract `archive` into `target_dir`, creating the directory first.
    ///
    /// Existing files in `target_dir` are overwritten. On failure the
    /// directory may hold partial output.
    async fn extract(&self, archive: &Path, target_dir: &Path) -> Result<()>;
}

/// Extracts archives by running `unrar x -o+ -y <archive> <target>/`.
#[derive(Debug, Clone)]
pub struct UnrarExtractor {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl UnrarExtractor {
    /// Create an extractor that runs the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Build an extractor from tool configuration.
    ///
    /// A missing binary is not fatal here: every extraction will fail with
    /// [`Error::Extraction`] until it is installed.
    pub fn from_config(config: &ToolsConfig) -> Self {
        let program = get_tool_path(UNRAR, config.unrar_path.as_deref()).unwrap_or_else(|_| {
            tracing::warn!("{UNRAR} not found; archive extraction will fail until it is installed");
            PathBuf::from(UNRAR)
        });

        Self::new(program).with_timeout(config.extract_timeout())
    }

    /// Kill the process and fail if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the program this extractor runs.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl ExtractionService for UnrarExtractor {
    async fn extract(&self, archive: &Path, target_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(target_dir).await.map_err(|e| {
            Error::extraction(None, format!("failed to create {}: {e}", target_dir.display()))
        })?;

        // unrar only treats the last argument as a destination when it ends
        // with a path separator.
        let mut destination = target_dir.as_os_str().to_owned();
        destination.push(std::path::MAIN_SEPARATOR_STR);

        let mut cmd = Command::new(&self.program);
        cmd.arg("x")
            .arg("-o+")
            .arg("-y")
            .arg(archive)
            .arg(&destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %self.program.display(),
            archive = %archive.display(),
            target = %target_dir.display(),
            "Running extraction"
        );

        let child = cmd
            .spawn()
            .map_err(|e| Error::extraction(None, format!("failed to spawn {UNRAR}: {e}")))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::extraction(None, format!("{UNRAR} timed out after {limit:?}")))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| Error::extraction(None, format!("I/O error waiting for {UNRAR}: {e}")))?;

        if output.status.success() {
            tracing::info!(archive = %archive.display(), target = %target_dir.display(), "Extraction complete");
            return Ok(());
        }

        let code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().map(str::trim).rfind(|l| !l.is_empty());
        let message = match (code, detail) {
            (Some(code), Some(detail)) => format!("Unrar failed with code {code}: {detail}"),
            (Some(code), None) => format!("Unrar failed with code {code}"),
            (None, _) => "Unrar terminated by signal".to_string(),
        };

        tracing::warn!(archive = %archive.display(), code = ?code, "{message}");
        Err(Error::extraction(code, message))
    }
}
