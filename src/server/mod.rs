use crate::config::Config;
use crate::extract::{check_tool, UNRAR};
use crate::pipeline::FetchPipeline;
use crate::retention::{spawn_retention_task, RetentionSweeper};
use crate::streaming;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error;
pub mod routes_fetch;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Fetch → extract → resolve pipeline over the storage roots
    pub pipeline: Arc<FetchPipeline>,
}

impl AppContext {
    pub fn new(config: Config, pipeline: FetchPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build the production context from configuration.
    pub fn from_config(config: Config) -> Self {
        let pipeline = FetchPipeline::from_config(&config);
        Self::new(config, pipeline)
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    let mut app = Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(routes_fetch::fetch_routes())
        .nest("/stream", streaming::stream_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Serve static files if directory is provided
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            app = app.fallback_service(ServeDir::new(&dir).append_index_html_on_directories(true));
        }
    }

    app
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server and the retention task.
///
/// Runs until SIGINT/SIGTERM, then stops the retention task before
/// returning.
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let tool = check_tool(UNRAR, config.tools.unrar_path.as_deref());
    if tool.available {
        tracing::info!(
            "Found {} {}",
            tool.name,
            tool.version.as_deref().unwrap_or("(unknown version)")
        );
    } else {
        tracing::warn!("{} is not installed; fetch requests will fail at extraction", UNRAR);
    }

    let ctx = AppContext::from_config(config.clone());
    ctx.pipeline
        .prepare_roots()
        .await
        .context("Failed to create storage directories")?;

    let cancel = CancellationToken::new();
    let retention = spawn_retention_task(
        RetentionSweeper::from_config(&config),
        config.retention.interval(),
        cancel.clone(),
    );

    let app = create_router(ctx, config.server.static_dir.clone());

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    if let Err(e) = retention.await {
        tracing::warn!("Retention task ended abnormally: {}", e);
    }

    served?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
