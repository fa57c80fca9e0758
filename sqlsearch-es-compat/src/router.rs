//! ES-compatible API router

use crate::endpoints::{
    bulk_handler, cat_indices_handler, cluster_health_handler, create_index_handler,
    get_template_handler, head_handler, index_document_handler, list_templates_handler,
    mapping_handler, msearch_handler, put_template_handler, root_handler, search_handler,
    EsCompatState,
};
use axum::routing::{get, post, put};
use axum::Router;
use sqlsearch::SearchEngine;
use std::sync::Arc;

/// Create the ES-compatible router
///
/// Routes are served at the root, the way ES clients expect them:
///
/// - `GET /`, `HEAD /` - Cluster info
/// - `GET /_cluster/health` - Cluster health
/// - `GET /_cat/indices` - List indices
/// - `GET /_template`, `PUT|GET /_template/{name}` - Templates
/// - `PUT /{index}` - Create index
/// - `POST|PUT /{index}/_doc`, `POST /{index}/_create` - Index a document
/// - `POST /{index}/_search` - Search
/// - `POST|GET /_msearch`, `POST|GET /{index}/_msearch` - Multi-search
/// - `POST /_bulk`, `POST /{index}/_bulk` - Bulk indexing
/// - `GET /{index}/_mapping` - Mapping of the matching template
pub fn es_compat_router(engine: Arc<SearchEngine>) -> Router {
    let state = EsCompatState { engine };

    Router::new()
        // Cluster endpoints
        .route("/", get(root_handler).head(head_handler))
        .route("/_cluster/health", get(cluster_health_handler))
        .route("/_cat/indices", get(cat_indices_handler))
        // Templates
        .route("/_template", get(list_templates_handler))
        .route(
            "/_template/:name",
            put(put_template_handler).get(get_template_handler),
        )
        // Multi-search
        .route(
            "/_msearch",
            post(msearch_handler_no_index).get(msearch_handler_no_index),
        )
        .route("/:index/_msearch", post(msearch_handler).get(msearch_handler))
        // Bulk endpoints
        .route("/_bulk", post(bulk_handler_no_index))
        .route("/:index/_bulk", post(bulk_handler))
        // Index and document endpoints
        .route("/:index", put(create_index_handler))
        .route(
            "/:index/_doc",
            post(index_document_handler).put(index_document_handler),
        )
        .route("/:index/_create", post(index_document_handler))
        .route("/:index/_search", post(search_handler))
        .route("/:index/_mapping", get(mapping_handler))
        .with_state(state)
}

// Wrapper handlers for routes without index parameter
use crate::error::EsCompatError;
use crate::response::{EsBulkResponse, EsMSearchResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

async fn msearch_handler_no_index(
    state: State<EsCompatState>,
    body: Bytes,
) -> Result<Json<EsMSearchResponse>, EsCompatError> {
    msearch_handler(state, None, body).await
}

async fn bulk_handler_no_index(
    state: State<EsCompatState>,
    body: Bytes,
) -> Result<Json<EsBulkResponse>, EsCompatError> {
    bulk_handler(state, None, body).await
}
