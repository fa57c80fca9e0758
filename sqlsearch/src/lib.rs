//! sqlsearch: an Elasticsearch-compatible search core over SQLite JSON documents.
//!
//! A search request goes through four stages:
//!
//! 1. [`dsl`] decodes the request body, accepting the shorthand and verbose
//!    surface forms clients send for the same query.
//! 2. [`plan`] compiles the decoded request into an ordered list of
//!    [`plan::PlanNode`]s, one per top-level aggregation plus a terminal hits node.
//! 3. [`engine`] executes each node against a [`storage::DocumentStore`], in order.
//! 4. [`aggregations`] turns the raw rows of each aggregation node back into
//!    typed results, and [`document`] converts stored hits back into the
//!    client's date formats.

pub mod aggregations;
pub mod config;
pub mod date;
pub mod document;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod plan;
pub mod response;
pub mod storage;
pub mod templates;

pub use config::Config;
pub use engine::SearchEngine;
pub use error::{Error, ErrorKind, Result};
