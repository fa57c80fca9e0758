//! Search response wire format

use crate::aggregations::AggregationResult;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub took: u64,
    pub timed_out: bool,
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
    pub hits: Hits,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregations: BTreeMap<String, AggregationResult>,
}

impl SearchResponse {
    pub fn new(took: u64, documents: Vec<Document>, aggregations: BTreeMap<String, AggregationResult>) -> Self {
        Self {
            took,
            timed_out: false,
            shards: ShardStats::default(),
            hits: Hits {
                total: documents.len() as u64,
                hits: documents,
            },
            aggregations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardStats {
    pub total: u32,
    pub successful: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl Default for ShardStats {
    fn default() -> Self {
        Self {
            total: 1,
            successful: 1,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Returned documents; `total` counts the documents in this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hits {
    pub total: u64,
    pub hits: Vec<Document>,
}

/// A returned document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub doc_id: String,
    pub id: i64,
    #[serde(rename = "_source")]
    pub source: Value,
}

impl Document {
    pub fn new(index: &str, rowid: i64, source: Value) -> Self {
        Self {
            index: index.to_string(),
            doc_id: rowid.to_string(),
            id: rowid,
            source,
        }
    }
}
