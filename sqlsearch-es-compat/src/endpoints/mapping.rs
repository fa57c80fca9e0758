//! ES-compatible _mapping endpoint

use crate::endpoints::EsCompatState;
use crate::response::TemplateMappingResponse;
use axum::extract::{Path, State};
use axum::Json;

/// GET /{index}/_mapping
///
/// Returns the template matching `index`, keyed by the index name, or an
/// empty object when no template matches.
pub async fn mapping_handler(
    State(state): State<EsCompatState>,
    Path(index): Path<String>,
) -> Json<TemplateMappingResponse> {
    let mut response = TemplateMappingResponse::new();
    if let Some(mapping) = state.engine.templates().lookup(&index) {
        response.insert(index, mapping.as_ref().clone());
    }
    Json(response)
}
