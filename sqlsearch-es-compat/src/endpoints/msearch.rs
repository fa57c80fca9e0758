//! ES-compatible _msearch endpoint

use crate::endpoints::search::first_index;
use crate::endpoints::EsCompatState;
use crate::error::EsCompatError;
use crate::response::{EsError, EsMSearchItem, EsMSearchResponse};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use sqlsearch::dsl::SearchRequest;
use sqlsearch::SearchEngine;
use std::time::Instant;

/// Header line of one search in a multi-search body
#[derive(Debug, Default, Deserialize)]
struct MSearchHeader {
    #[serde(default)]
    index: Option<IndexTarget>,
    #[serde(default)]
    indices: Option<Vec<String>>,
}

/// `index` may be a name, a comma list, or an array of names
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndexTarget {
    One(String),
    Many(Vec<String>),
}

impl MSearchHeader {
    fn target<'a>(&'a self, path_index: Option<&'a str>) -> Option<&'a str> {
        let from_header = match &self.index {
            Some(IndexTarget::One(name)) => Some(name.as_str()),
            Some(IndexTarget::Many(names)) => names.first().map(String::as_str),
            None => self
                .indices
                .as_ref()
                .and_then(|names| names.first())
                .map(String::as_str),
        };
        from_header.or(path_index).map(first_index)
    }
}

/// POST|GET /_msearch, POST|GET /{index}/_msearch
///
/// Each search runs on its own: a failing search becomes an error item and
/// the others still return results.
pub async fn msearch_handler(
    State(state): State<EsCompatState>,
    index: Option<Path<String>>,
    body: Bytes,
) -> Result<Json<EsMSearchResponse>, EsCompatError> {
    let start = Instant::now();
    let path_index = index.map(|p| p.0);

    let text =
        std::str::from_utf8(&body).map_err(|e| EsCompatError::InvalidRequestBody(e.to_string()))?;
    let searches = parse_msearch_body(text)?;

    let mut responses = Vec::with_capacity(searches.len());
    for (header, request) in searches {
        let target = header.target(path_index.as_deref());
        responses.push(execute_single_search(&state.engine, target, request).await);
    }

    Ok(Json(EsMSearchResponse {
        took: start.elapsed().as_millis() as u64,
        responses,
    }))
}

/// Split an NDJSON multi-search body into header/body pairs.
///
/// Bodies are left raw so that a malformed query only fails its own search.
fn parse_msearch_body(text: &str) -> Result<Vec<(MSearchHeader, &str)>, EsCompatError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.len() % 2 != 0 {
        return Err(EsCompatError::InvalidRequestBody(
            "msearch body must have header/body pairs".to_string(),
        ));
    }

    let mut searches = Vec::with_capacity(lines.len() / 2);
    for chunk in lines.chunks(2) {
        let header: MSearchHeader = serde_json::from_str(chunk[0])
            .map_err(|e| EsCompatError::InvalidRequestBody(format!("Invalid header: {}", e)))?;
        searches.push((header, chunk[1]));
    }

    Ok(searches)
}

async fn execute_single_search(
    engine: &SearchEngine,
    index: Option<&str>,
    body: &str,
) -> EsMSearchItem {
    let result = match index {
        Some(index) => match SearchRequest::from_slice(body.as_bytes()) {
            Ok(request) => engine.search(index, &request).await.map_err(EsCompatError::from),
            Err(e) => Err(EsCompatError::from(e)),
        },
        None => Err(EsCompatError::InvalidRequestBody(
            "no index in msearch header or path".to_string(),
        )),
    };

    match result {
        Ok(response) => EsMSearchItem::Success(response),
        Err(err) => EsMSearchItem::Error {
            error: EsError::from(&err),
            status: err.status_code().as_u16(),
        },
    }
}
