//! Error types for ES compatibility layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crate::response::EsError;
use serde::Serialize;
use sqlsearch::ErrorKind;

/// ES compatibility layer errors
#[derive(Debug, thiserror::Error)]
pub enum EsCompatError {
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error(transparent)]
    Engine(#[from] sqlsearch::Error),
}

/// Elasticsearch-style error response
#[derive(Debug, Serialize)]
struct EsErrorResponse {
    error: EsErrorDetail,
    status: u16,
}

#[derive(Debug, Serialize)]
struct EsErrorDetail {
    root_cause: Vec<RootCause>,
    #[serde(rename = "type")]
    error_type: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct RootCause {
    #[serde(rename = "type")]
    error_type: String,
    reason: String,
}

impl EsCompatError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequestBody(_) => "parse_exception",
            Self::Engine(e) => match e.kind() {
                ErrorKind::Decode => "parsing_exception",
                ErrorKind::Compile => "search_phase_execution_exception",
                ErrorKind::Format => "mapper_parsing_exception",
                ErrorKind::IndexNotFound => "index_not_found_exception",
                ErrorKind::InvalidIndexName => "invalid_index_name_exception",
                ErrorKind::Template => "invalid_index_template_exception",
                ErrorKind::RowShape
                | ErrorKind::Storage
                | ErrorKind::Config
                | ErrorKind::Io => "exception",
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e.kind() {
                ErrorKind::Decode
                | ErrorKind::Compile
                | ErrorKind::Format
                | ErrorKind::InvalidIndexName
                | ErrorKind::Template => StatusCode::BAD_REQUEST,
                ErrorKind::IndexNotFound => StatusCode::NOT_FOUND,
                ErrorKind::RowShape
                | ErrorKind::Storage
                | ErrorKind::Config
                | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<&EsCompatError> for EsError {
    fn from(err: &EsCompatError) -> Self {
        EsError {
            error_type: err.error_type().to_string(),
            reason: err.to_string(),
        }
    }
}

impl IntoResponse for EsCompatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type().to_string();
        let reason = self.to_string();

        let body = EsErrorResponse {
            error: EsErrorDetail {
                root_cause: vec![RootCause {
                    error_type: error_type.clone(),
                    reason: reason.clone(),
                }],
                error_type,
                reason,
            },
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}
