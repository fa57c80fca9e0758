//! ES-compatible response bodies for the non-search endpoints
//!
//! Search responses come straight from [`sqlsearch::response::SearchResponse`].

use serde::Serialize;
use sqlsearch::response::{SearchResponse, ShardStats};
use sqlsearch::templates::TemplateMapping;
use std::collections::BTreeMap;

/// Response to indexing a single document
#[derive(Debug, Clone, Serialize)]
pub struct IndexDocumentResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    pub result: String,
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
}

impl IndexDocumentResponse {
    pub fn created(index: &str, rowid: i64) -> Self {
        Self {
            index: index.to_string(),
            id: rowid.to_string(),
            version: 1,
            result: "created".to_string(),
            shards: ShardStats::default(),
        }
    }
}

/// Response to `PUT /{index}`
#[derive(Debug, Clone, Serialize)]
pub struct CreateIndexResponse {
    pub acknowledged: bool,
    pub shards_acknowledged: bool,
    pub index: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcknowledgedResponse {
    pub acknowledged: bool,
}

/// Templates keyed by name, or one mapping keyed by index name
pub type TemplateMappingResponse = BTreeMap<String, TemplateMapping>;

/// ES multi-search response
#[derive(Debug, Clone, Serialize)]
pub struct EsMSearchResponse {
    pub took: u64,
    pub responses: Vec<EsMSearchItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EsMSearchItem {
    Success(SearchResponse),
    Error { error: EsError, status: u16 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub reason: String,
}

/// ES bulk response
#[derive(Debug, Clone, Serialize)]
pub struct EsBulkResponse {
    pub took: u64,
    pub errors: bool,
    pub items: Vec<BulkItemResponse>,
}

/// One bulk item, keyed by the action that produced it
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<BulkItemResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<BulkItemResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<BulkItemResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<BulkItemResult>,
}

impl BulkItemResponse {
    /// Wrap `result` under the key named by `action`.
    pub fn for_action(action: &str, result: BulkItemResult) -> Self {
        let mut item = Self {
            index: None,
            create: None,
            delete: None,
            update: None,
        };
        match action {
            "create" => item.create = Some(result),
            "delete" => item.delete = Some(result),
            "update" => item.update = Some(result),
            _ => item.index = Some(result),
        }
        item
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_version", skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "_shards", skip_serializing_if = "Option::is_none")]
    pub shards: Option<ShardStats>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EsError>,
}

impl BulkItemResult {
    pub fn created(index: &str, rowid: i64) -> Self {
        Self {
            index: index.to_string(),
            id: Some(rowid.to_string()),
            version: Some(1),
            result: Some("created".to_string()),
            shards: Some(ShardStats::default()),
            status: 201,
            error: None,
        }
    }

    pub fn failed(index: &str, status: u16, error: EsError) -> Self {
        Self {
            index: index.to_string(),
            id: None,
            version: None,
            result: None,
            shards: None,
            status,
            error: Some(error),
        }
    }
}

/// ES cluster health response
#[derive(Debug, Clone, Serialize)]
pub struct EsClusterHealth {
    pub cluster_name: String,
    pub status: String,
    pub timed_out: bool,
    pub number_of_nodes: u32,
    pub number_of_data_nodes: u32,
    pub active_primary_shards: u32,
    pub active_shards: u32,
    pub relocating_shards: u32,
    pub initializing_shards: u32,
    pub unassigned_shards: u32,
    pub number_of_pending_tasks: u32,
    pub active_shards_percent_as_number: f64,
}

impl EsClusterHealth {
    pub fn single_node(indices: u32) -> Self {
        Self {
            cluster_name: CLUSTER_NAME.to_string(),
            status: "green".to_string(),
            timed_out: false,
            number_of_nodes: 1,
            number_of_data_nodes: 1,
            active_primary_shards: indices,
            active_shards: indices,
            relocating_shards: 0,
            initializing_shards: 0,
            unassigned_shards: 0,
            number_of_pending_tasks: 0,
            active_shards_percent_as_number: 100.0,
        }
    }
}

const CLUSTER_NAME: &str = "sqlsearch";

/// ES root info response (`GET /`)
#[derive(Debug, Clone, Serialize)]
pub struct EsRootInfo {
    pub name: String,
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub version: EsVersion,
    pub tagline: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EsVersion {
    pub number: String,
    pub build_flavor: String,
    pub build_type: String,
    pub build_snapshot: bool,
    pub lucene_version: String,
    pub minimum_wire_compatibility_version: String,
    pub minimum_index_compatibility_version: String,
}

impl Default for EsRootInfo {
    fn default() -> Self {
        Self {
            name: CLUSTER_NAME.to_string(),
            cluster_name: CLUSTER_NAME.to_string(),
            cluster_uuid: "sqlsearch-single-node".to_string(),
            version: EsVersion {
                // Clients gate features on the major version
                number: "7.10.2".to_string(),
                build_flavor: "oss".to_string(),
                build_type: "sqlite".to_string(),
                build_snapshot: false,
                lucene_version: "8.7.0".to_string(),
                minimum_wire_compatibility_version: "6.8.0".to_string(),
                minimum_index_compatibility_version: "6.0.0-beta1".to_string(),
            },
            tagline: "You Know, for Search".to_string(),
        }
    }
}

/// ES cat indices row
#[derive(Debug, Clone, Serialize)]
pub struct EsCatIndex {
    pub health: String,
    pub status: String,
    pub index: String,
    pub pri: String,
    pub rep: String,
    #[serde(rename = "docs.count")]
    pub docs_count: String,
    #[serde(rename = "docs.deleted")]
    pub docs_deleted: String,
}

impl From<sqlsearch::engine::IndexStats> for EsCatIndex {
    fn from(stats: sqlsearch::engine::IndexStats) -> Self {
        Self {
            health: "green".to_string(),
            status: "open".to_string(),
            index: stats.name,
            pri: "1".to_string(),
            rep: "0".to_string(),
            docs_count: stats.docs_count.to_string(),
            docs_deleted: "0".to_string(),
        }
    }
}
