//! Integration tests for configuration discovery.
//!
//! These change the process working directory, so they run serially.

use rarstream::config::{load_config_or_default, Config};
use serial_test::serial;
use std::path::Path;
use std::time::Duration;

struct CwdGuard(std::path::PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        Self(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}

#[test]
#[serial]
fn picks_up_rarstream_toml_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("rarstream.toml"),
        r#"
[server]
port = 8123

[retention]
max_age_secs = 60
interval_secs = 30
sweep_downloads = true
"#,
    )
    .unwrap();

    let _cwd = CwdGuard::enter(dir.path());
    let config = load_config_or_default(None).unwrap();

    assert_eq!(config.server.port, 8123);
    assert_eq!(config.retention.max_age(), Duration::from_secs(60));
    assert_eq!(config.retention.interval(), Duration::from_secs(30));
    assert!(config.retention.sweep_downloads);
}

#[test]
#[serial]
fn config_toml_takes_precedence() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[server]\nport = 1111\n").unwrap();
    std::fs::write(dir.path().join("rarstream.toml"), "[server]\nport = 2222\n").unwrap();

    let _cwd = CwdGuard::enter(dir.path());
    let config = load_config_or_default(None).unwrap();

    assert_eq!(config.server.port, 1111);
}

#[test]
#[serial]
fn falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let _cwd = CwdGuard::enter(dir.path());
    let config = load_config_or_default(None).unwrap();
    let defaults = Config::default();

    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.storage.download_dir, defaults.storage.download_dir);
    assert_eq!(config.storage.extract_dir, defaults.storage.extract_dir);
}
