//! Aggregation result types and their wire shape

use crate::dsl::AggregationCategory;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Text placed in `value_as_string` of bucket sub-aggregations
pub const VALUE_AS_STRING_PLACEHOLDER: &str = "n/a";

/// Result of one aggregation, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregationResult {
    Bucket(BucketAggregation),
    MetricSingle(MetricSingleAggregation),
    MetricMultiple(MetricMultipleAggregation),
}

impl AggregationResult {
    pub fn category(&self) -> AggregationCategory {
        match self {
            Self::Bucket(_) => AggregationCategory::Bucket,
            Self::MetricSingle(_) => AggregationCategory::MetricsSingle,
            Self::MetricMultiple(_) => AggregationCategory::MetricsMultiple,
        }
    }

    pub fn as_buckets(&self) -> Option<&BucketAggregation> {
        match self {
            Self::Bucket(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_metric(&self) -> Option<&MetricSingleAggregation> {
        match self {
            Self::MetricSingle(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketAggregation {
    pub doc_count_error_upper_bound: i64,
    pub buckets: Vec<Bucket>,
}

/// One bucket. Sub-aggregations serialize as siblings of `key` and
/// `doc_count`:
///
/// ```json
/// {"key": "api", "doc_count": 3, "duration": {"value": 12.5, "value_as_string": "n/a"}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,

    pub doc_count: i64,

    #[serde(flatten)]
    pub sub_aggregations: BTreeMap<String, SubAggregateValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubAggregateValue {
    pub value: Value,
    pub value_as_string: String,
}

impl SubAggregateValue {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            value_as_string: VALUE_AS_STRING_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSingleAggregation {
    pub value: Value,
}

/// Not filled by the assembler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricMultipleAggregation {
    pub values: Vec<f64>,
}
