//! ES-compatible cluster endpoints

use crate::endpoints::EsCompatState;
use crate::error::EsCompatError;
use crate::response::{EsCatIndex, EsClusterHealth, EsRootInfo};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sqlsearch::storage::DocumentStore;

/// GET / - Root info (ES version info)
pub async fn root_handler() -> Json<EsRootInfo> {
    Json(EsRootInfo::default())
}

/// HEAD / - Liveness probe
pub async fn head_handler() -> StatusCode {
    StatusCode::OK
}

/// GET /_cluster/health
pub async fn cluster_health_handler(
    State(state): State<EsCompatState>,
) -> Result<Json<EsClusterHealth>, EsCompatError> {
    let indices = state.engine.store().list_tables().await?;
    Ok(Json(EsClusterHealth::single_node(indices.len() as u32)))
}

/// GET /_cat/indices
pub async fn cat_indices_handler(
    State(state): State<EsCompatState>,
) -> Result<Json<Vec<EsCatIndex>>, EsCompatError> {
    let stats = state.engine.list_indices().await?;
    Ok(Json(stats.into_iter().map(EsCatIndex::from).collect()))
}
