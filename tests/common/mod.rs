//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates temporary storage roots, a default
//! config pointing at them, and a full [`AppContext`] whose extraction stage
//! is a [`FakeExtractor`]. The [`TestHarness::with_server`] constructor
//! starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use rarstream::config::Config;
use rarstream::extract::ExtractionService;
use rarstream::fetch::Fetcher;
use rarstream::pipeline::FetchPipeline;
use rarstream::server::{create_router, AppContext};
use rarstream_common::{Error, Result};

/// What a [`FakeExtractor`] puts into the extraction directory.
#[derive(Debug, Clone)]
pub enum FakeOutput {
    /// Write these files with fixed contents.
    Files(Vec<(String, Vec<u8>)>),
    /// Copy the downloaded archive bytes verbatim into a file of this name.
    CopyArchiveAs(String),
    /// Create the directory, then fail like unrar exiting with this code.
    Fail(i32),
}

/// Stand-in for `unrar` that never needs a real archive.
#[derive(Debug)]
pub struct FakeExtractor {
    output: FakeOutput,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(output: FakeOutput) -> Self {
        Self {
            output,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn files(files: &[(&str, &[u8])]) -> Self {
        Self::new(FakeOutput::Files(
            files
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionService for FakeExtractor {
    async fn extract(&self, archive: &Path, target_dir: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::create_dir_all(target_dir).await?;

        match &self.output {
            FakeOutput::Files(files) => {
                for (name, data) in files {
                    tokio::fs::write(target_dir.join(name), data).await?;
                }
                Ok(())
            }
            FakeOutput::CopyArchiveAs(name) => {
                tokio::fs::copy(archive, target_dir.join(name)).await?;
                Ok(())
            }
            FakeOutput::Fail(code) => Err(Error::extraction(
                Some(*code),
                format!("Unrar failed with code {code}"),
            )),
        }
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] over temporary
/// storage roots.
pub struct TestHarness {
    pub ctx: AppContext,
    pub extractor: Arc<FakeExtractor>,
    root: tempfile::TempDir,
}

impl TestHarness {
    /// Create a harness whose extractor produces `output`.
    pub fn new(output: FakeOutput) -> Self {
        Self::with_extractor(Arc::new(FakeExtractor::new(output)))
    }

    /// Create a harness around an existing fake extractor.
    pub fn with_extractor(extractor: Arc<FakeExtractor>) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");

        let mut config = Config::default();
        config.storage.download_dir = root.path().join("uploads");
        config.storage.extract_dir = root.path().join("extracted");
        std::fs::create_dir_all(&config.storage.download_dir).unwrap();
        std::fs::create_dir_all(&config.storage.extract_dir).unwrap();

        let pipeline = FetchPipeline::new(
            Fetcher::new(&config.fetch),
            extractor.clone(),
            config.storage.download_dir.clone(),
            config.storage.extract_dir.clone(),
        );

        Self {
            ctx: AppContext::new(config, pipeline),
            extractor,
            root,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(output: FakeOutput) -> (Self, SocketAddr) {
        let harness = Self::new(output);
        let addr = harness.serve().await;
        (harness, addr)
    }

    /// Serve this harness' router on a random port.
    pub async fn serve(&self) -> SocketAddr {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn download_dir(&self) -> PathBuf {
        self.ctx.config.storage.download_dir.clone()
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.ctx.config.storage.extract_dir.clone()
    }

    /// Names of the entries directly under `dir`, sorted.
    pub fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Deterministic non-trivial test payload.
pub fn sample_video(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// POST `/fetch` with `{"url": url}` against a running server.
pub async fn post_fetch(addr: SocketAddr, url: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/fetch"))
        .json(&serde_json::json!({ "url": url }))
        .send()
        .await
        .unwrap()
}
