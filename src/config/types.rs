use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static assets served for any unmatched route
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where downloaded archives are written
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Root under which each archive gets its own extraction directory
    #[serde(default = "default_extract_dir")]
    pub extract_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_extract_dir() -> PathBuf {
    PathBuf::from("extracted")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            extract_dir: default_extract_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Extraction directories older than this are deleted (default: 1 hour)
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// How often the sweep runs (default: 30 minutes)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Also delete downloaded archives older than the retention window
    #[serde(default)]
    pub sweep_downloads: bool,
}

fn default_max_age() -> u64 {
    60 * 60
}

fn default_interval() -> u64 {
    30 * 60
}

impl RetentionConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age(),
            interval_secs: default_interval(),
            sweep_downloads: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("rarstream/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit path to the unrar binary (falls back to PATH lookup)
    #[serde(default)]
    pub unrar_path: Option<PathBuf>,

    /// Kill extraction after this many seconds; 0 disables the limit
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
}

fn default_extract_timeout() -> u64 {
    60 * 60
}

impl ToolsConfig {
    pub fn extract_timeout(&self) -> Option<Duration> {
        (self.extract_timeout_secs > 0).then(|| Duration::from_secs(self.extract_timeout_secs))
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            unrar_path: None,
            extract_timeout_secs: default_extract_timeout(),
        }
    }
}
