//! ES-compatible _search endpoint

use crate::endpoints::EsCompatState;
use crate::error::EsCompatError;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use sqlsearch::response::SearchResponse;
use tracing::warn;

/// POST /{index}/_search
///
/// An empty body searches everything with the default page size.
pub async fn search_handler(
    State(state): State<EsCompatState>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<Json<SearchResponse>, EsCompatError> {
    let target = first_index(&index);
    let response = state.engine.search_body(target, &body).await?;
    Ok(Json(response))
}

/// First entry of a comma-separated index list.
///
/// Only one index is searched per request; the rest are dropped with a warning.
pub(crate) fn first_index(indices: &str) -> &str {
    let mut parts = indices.split(',').map(str::trim);
    let first = parts.next().unwrap_or(indices);
    let skipped: Vec<&str> = parts.filter(|p| !p.is_empty()).collect();
    if !skipped.is_empty() {
        warn!(
            "Searching only '{}', ignoring indices {:?}",
            first, skipped
        );
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_index_single() {
        assert_eq!(first_index("logs"), "logs");
    }

    #[test]
    fn test_first_index_list() {
        assert_eq!(first_index("jaeger-span-a,jaeger-span-b"), "jaeger-span-a");
        assert_eq!(first_index(" a , b"), "a");
    }

    #[test]
    fn test_first_index_trailing_comma() {
        assert_eq!(first_index("a,"), "a");
    }
}
