//! Index creation and single-document indexing

use crate::endpoints::EsCompatState;
use crate::error::EsCompatError;
use crate::response::{CreateIndexResponse, IndexDocumentResponse};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::debug;

/// PUT /{index}
///
/// Settings and mappings in the body are ignored. Creating an index that
/// already exists is acknowledged.
pub async fn create_index_handler(
    State(state): State<EsCompatState>,
    Path(index): Path<String>,
) -> Result<Json<CreateIndexResponse>, EsCompatError> {
    if !state.engine.create_index(&index).await? {
        debug!("Index '{}' already exists", index);
    }
    Ok(Json(CreateIndexResponse {
        acknowledged: true,
        shards_acknowledged: true,
        index,
    }))
}

/// POST|PUT /{index}/_doc, POST /{index}/_create
pub async fn index_document_handler(
    State(state): State<EsCompatState>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<IndexDocumentResponse>), EsCompatError> {
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| EsCompatError::InvalidRequestBody(format!("Invalid document: {}", e)))?;
    let rowid = state.engine.index_document(&index, document).await?;
    Ok((
        StatusCode::CREATED,
        Json(IndexDocumentResponse::created(&index, rowid)),
    ))
}
