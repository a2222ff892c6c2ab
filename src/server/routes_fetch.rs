use crate::server::error::AppError;
use crate::server::AppContext;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use rarstream_common::Error;
use serde::{Deserialize, Serialize};

pub fn fetch_routes() -> Router<AppContext> {
    Router::new().route("/fetch", post(fetch_archive))
}

#[derive(Debug, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    pub message: String,
    pub stream_url: String,
}

/// POST /fetch
///
/// Downloads the archive, extracts it, and returns the stream path of the
/// selected media file. Concurrent calls each get their own job directory.
async fn fetch_archive(
    State(ctx): State<AppContext>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<FetchResponse>, AppError> {
    let Json(request) = payload
        .map_err(|rejection| Error::validation(format!("bad request body: {rejection}")))?;
    let url = request
        .url
        .ok_or_else(|| Error::validation("missing url field"))?;

    let outcome = ctx.pipeline.run(&url).await?;

    Ok(Json(FetchResponse {
        message: "Download and extraction successful.".to_string(),
        stream_url: outcome.reference.stream_path(),
    }))
}
