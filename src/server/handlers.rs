//! HTTP request handlers

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use crate::chunking::{ChunkingError, SemanticChunker, validate_budget};
use crate::decode::decode_text;
use crate::{debug_event, log_event};

/// Response header carrying the number of oversized chunks.
pub const OVERSIZED_HEADER: &str = "x-oversized-chunks";

/// Multipart field holding the document.
const FILE_FIELD: &str = "file";

/// Query parameters of the chunking endpoint.
#[derive(Debug, Deserialize)]
pub struct ChunkParams {
    pub max_tokens: Option<i64>,
    pub model: Option<String>,
    pub percentile: Option<i64>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Chunk an uploaded document.
pub async fn chunk_document(
    State(state): State<AppState>,
    params: Result<Query<ChunkParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    // Budget and percentile are checked before the upload is read
    let max_tokens = params
        .max_tokens
        .ok_or_else(|| ApiError::BadRequest("max_tokens query parameter is required".into()))?;
    validate_budget(max_tokens)?;
    let config = state
        .settings
        .chunking
        .clone()
        .with_percentile(params.percentile)?;

    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let bytes = read_file_field(&mut multipart).await?;
    let decoded = decode_text(&bytes)?;
    debug_event!(
        "http",
        "upload",
        "{} bytes, {}",
        bytes.len(),
        decoded.encoding.name()
    );

    let provider = state.provider.clone();
    let model = params.model;
    let result = tokio::task::spawn_blocking(move || -> Result<_, ChunkingError> {
        let model = provider.resolve(model.as_deref())?;
        SemanticChunker::new(model, config).chunk(&decoded.text, max_tokens)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("chunking task failed: {e}")))??;

    log_event!(
        "http",
        "chunked",
        "{} chunks in {:.3}s",
        result.metadata.n_chunks,
        result.metadata.processing_time
    );

    let mut response = Json(&result).into_response();
    if result.has_oversized() {
        response
            .headers_mut()
            .insert(OVERSIZED_HEADER, HeaderValue::from(result.warnings.len()));
    }
    Ok(response)
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }

    Err(ApiError::BadRequest(format!(
        "missing multipart field '{FILE_FIELD}'"
    )))
}
