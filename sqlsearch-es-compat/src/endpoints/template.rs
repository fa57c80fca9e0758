//! Index template endpoints

use crate::endpoints::EsCompatState;
use crate::error::EsCompatError;
use crate::response::{AcknowledgedResponse, TemplateMappingResponse};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlsearch::templates::CreateTemplateRequest;

/// PUT /_template/{name}
pub async fn put_template_handler(
    State(state): State<EsCompatState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<AcknowledgedResponse>, EsCompatError> {
    let request: CreateTemplateRequest = serde_json::from_slice(&body)
        .map_err(|e| EsCompatError::InvalidRequestBody(format!("Invalid template: {}", e)))?;
    state.engine.put_template(&name, request).await?;
    Ok(Json(AcknowledgedResponse { acknowledged: true }))
}

/// GET /_template/{name}
///
/// An unknown name answers 404 with an empty object.
pub async fn get_template_handler(
    State(state): State<EsCompatState>,
    Path(name): Path<String>,
) -> (StatusCode, Json<TemplateMappingResponse>) {
    let mut response = TemplateMappingResponse::new();
    match state.engine.templates().get(&name) {
        Some(mapping) => {
            response.insert(name, mapping.as_ref().clone());
            (StatusCode::OK, Json(response))
        }
        None => (StatusCode::NOT_FOUND, Json(response)),
    }
}

/// GET /_template
pub async fn list_templates_handler(State(state): State<EsCompatState>) -> Json<TemplateMappingResponse> {
    let response = state
        .engine
        .templates()
        .list()
        .into_iter()
        .map(|(name, mapping)| (name, mapping.as_ref().clone()))
        .collect();
    Json(response)
}
