mod cli;

use rarstream::{
    config,
    extract::{check_tool, UNRAR},
    pipeline::FetchPipeline,
    retention::RetentionSweeper,
    server,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting rarstream server");
    tracing::info!(
        "Downloads in {:?}, extractions in {:?}",
        config.storage.download_dir,
        config.storage.extract_dir
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "rarstream=debug,rarstream_common=debug,tower_http=debug".to_string()
        } else {
            "rarstream=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Fetch { url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch_once(&url, cli.config.as_deref()))
        }
        Commands::Sweep => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sweep_once(cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("rarstream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn fetch_once(url: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pipeline = FetchPipeline::from_config(&config);
    pipeline
        .prepare_roots()
        .await
        .context("Failed to create storage directories")?;

    let outcome = pipeline.run(url).await?;

    println!("{}", outcome.reference.stream_path());
    tracing::debug!("Media file at {:?}", outcome.asset.absolute_path);
    Ok(())
}

async fn sweep_once(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let sweeper = RetentionSweeper::from_config(&config);
    let report = sweeper.sweep().await?;

    println!(
        "Removed: {}, retained: {}, failed: {}",
        report.removed, report.retained, report.failed
    );
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tool = check_tool(UNRAR, config.tools.unrar_path.as_deref());

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);

    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }

    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }

    println!();
    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("{} is missing. Install it to enable archive extraction.", UNRAR);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Download dir: {:?}", config.storage.download_dir);
            println!("  Extract dir: {:?}", config.storage.extract_dir);
            println!(
                "  Retention: {}s window, sweep every {}s",
                config.retention.max_age_secs, config.retention.interval_secs
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
