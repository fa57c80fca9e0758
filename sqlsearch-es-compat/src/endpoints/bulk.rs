//! ES-compatible _bulk endpoint

use crate::endpoints::EsCompatState;
use crate::error::EsCompatError;
use crate::response::{BulkItemResponse, BulkItemResult, EsBulkResponse, EsError};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use sqlsearch::SearchEngine;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Metadata of one bulk action line, e.g. `{"index": {"_index": "logs"}}`
#[derive(Debug, Default, Deserialize)]
struct BulkActionMeta {
    #[serde(rename = "_index", default)]
    index: Option<String>,
}

/// One parsed action with its source line, if the action carries one
#[derive(Debug, PartialEq)]
struct BulkAction<'a> {
    action: String,
    index: Option<String>,
    source: Option<&'a str>,
}

/// POST /_bulk, POST /{index}/_bulk
///
/// Only `index` and `create` actions write documents. Every other action, and
/// every document that fails to index, becomes an error item; the rest of the
/// batch still runs.
pub async fn bulk_handler(
    State(state): State<EsCompatState>,
    index: Option<Path<String>>,
    body: Bytes,
) -> Result<Json<EsBulkResponse>, EsCompatError> {
    let start = Instant::now();
    let default_index = index.map(|p| p.0);

    let text =
        std::str::from_utf8(&body).map_err(|e| EsCompatError::InvalidRequestBody(e.to_string()))?;
    let actions = parse_bulk_body(text, default_index.as_deref())?;
    debug!("Bulk request with {} actions", actions.len());

    let mut items = Vec::with_capacity(actions.len());
    let mut has_errors = false;

    for action in actions {
        let result = execute_action(&state.engine, &action).await;
        if result.error.is_some() {
            has_errors = true;
        }
        items.push(BulkItemResponse::for_action(&action.action, result));
    }

    Ok(Json(EsBulkResponse {
        took: start.elapsed().as_millis() as u64,
        errors: has_errors,
        items,
    }))
}

async fn execute_action(engine: &SearchEngine, action: &BulkAction<'_>) -> BulkItemResult {
    let index = action.index.clone().unwrap_or_default();

    if !matches!(action.action.as_str(), "index" | "create") {
        warn!("Unsupported bulk action '{}' on '{}'", action.action, index);
        return BulkItemResult::failed(
            &index,
            400,
            EsError {
                error_type: "illegal_argument_exception".to_string(),
                reason: format!("bulk action '{}' is not supported", action.action),
            },
        );
    }

    if index.is_empty() {
        return BulkItemResult::failed(
            &index,
            400,
            EsError {
                error_type: "action_request_validation_exception".to_string(),
                reason: "index is missing".to_string(),
            },
        );
    }

    let document: Value = match action.source.map(serde_json::from_str::<Value>).transpose() {
        Ok(Some(doc)) => doc,
        Ok(None) => Value::Object(Default::default()),
        Err(e) => {
            let err = EsCompatError::InvalidRequestBody(format!("Invalid document: {}", e));
            return BulkItemResult::failed(&index, 400, EsError::from(&err));
        }
    };

    match engine.index_document(&index, document).await {
        Ok(rowid) => BulkItemResult::created(&index, rowid),
        Err(e) => {
            warn!("bulk index error on '{}': {}", index, e);
            let err = EsCompatError::from(e);
            BulkItemResult::failed(&index, err.status_code().as_u16(), EsError::from(&err))
        }
    }
}

/// Parse an NDJSON bulk body into actions.
///
/// `delete` is the only action without a source line.
fn parse_bulk_body<'a>(
    text: &'a str,
    default_index: Option<&str>,
) -> Result<Vec<BulkAction<'a>>, EsCompatError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut actions = Vec::new();

    while let Some(line) = lines.next() {
        let meta: BTreeMap<String, BulkActionMeta> = serde_json::from_str(line)
            .map_err(|e| EsCompatError::InvalidRequestBody(format!("Invalid action: {}", e)))?;

        let mut entries = meta.into_iter();
        let (action, meta) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(EsCompatError::InvalidRequestBody(format!(
                    "action line must have exactly one key: {}",
                    line
                )))
            }
        };

        let source = if action == "delete" {
            None
        } else {
            Some(lines.next().ok_or_else(|| {
                EsCompatError::InvalidRequestBody(format!(
                    "'{}' action is missing its source line",
                    action
                ))
            })?)
        };

        actions.push(BulkAction {
            index: meta.index.or_else(|| default_index.map(str::to_string)),
            action,
            source,
        });
    }

    Ok(actions)
}
