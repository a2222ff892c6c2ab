mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./rarstream.toml",
        "~/.config/rarstream/config.toml",
        "/etc/rarstream/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.retention.max_age_secs == 0 {
        anyhow::bail!("Retention max_age_secs must be greater than 0");
    }

    if config.retention.interval_secs == 0 {
        anyhow::bail!("Retention interval_secs must be greater than 0");
    }

    if config.storage.download_dir == config.storage.extract_dir {
        anyhow::bail!(
            "download_dir and extract_dir must differ (both are {:?})",
            config.storage.download_dir
        );
    }

    if let Some(ref path) = config.tools.unrar_path {
        if !path.exists() {
            tracing::warn!("Configured unrar_path does not exist: {:?}", path);
        }
    }

    Ok(())
}
