//! Elasticsearch HTTP API compatibility layer for sqlsearch
//!
//! Serves the subset of the ES 7.x REST API that log and trace shippers
//! (Jaeger, Fluent Bit, Beats) need to write to and read from a SQLite
//! backed [`sqlsearch::SearchEngine`].
//!
//! # Endpoints
//!
//! - `GET /`, `HEAD /` - Cluster info
//! - `GET /_cluster/health` - Cluster health
//! - `GET /_cat/indices` - List indices
//! - `PUT /{index}` - Create index
//! - `POST|PUT /{index}/_doc`, `POST /{index}/_create` - Index one document
//! - `POST /{index}/_search` - Search with the query language
//! - `POST|GET /_msearch`, `/{index}/_msearch` - Multi-search
//! - `POST /_bulk`, `/{index}/_bulk` - Bulk indexing
//! - `PUT|GET /_template/{name}`, `GET /_template` - Index templates
//! - `GET /{index}/_mapping` - Mapping of the template matching an index

pub mod error;
pub mod response;
pub mod router;

mod endpoints;

pub use endpoints::EsCompatState;
pub use error::EsCompatError;
pub use router::es_compat_router;

/// Result type for ES compat operations
pub type Result<T> = std::result::Result<T, EsCompatError>;
