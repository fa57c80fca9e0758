//! Query language data model
//!
//! The request body of `_search`: a query, paging, sort, and a tree of
//! aggregations. Decoding accepts the shorthand forms clients commonly send
//! (see [`shorthand`]) and normalises them into one representation.

pub mod aggs;
pub mod query;
mod shorthand;

pub use aggs::{
    AggregateKind, Aggregate, AggregationCategory, Aggregations, DateHistogramAgg, FieldAgg,
    TermsAgg,
};
pub use query::{
    BoolQuery, Bound, Clause, MatchValue, Query, QueryString, RangeOp, RangeParams, TermValue,
};

use crate::{Error, Result};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Number of hits returned when `size` is absent
pub const DEFAULT_SIZE: usize = 10;

/// A decoded search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: Option<Query>,
    pub size: Option<usize>,
    pub from: Option<usize>,
    pub sort: Vec<SortEntry>,
    pub aggs: Aggregations,
}

#[derive(Deserialize)]
struct RawSearchRequest {
    #[serde(default)]
    query: Option<Query>,
    #[serde(default)]
    size: Option<usize>,
    #[serde(default)]
    from: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_sort")]
    sort: Vec<SortEntry>,
    #[serde(default)]
    aggs: Option<Aggregations>,
    #[serde(default)]
    aggregations: Option<Aggregations>,
}

impl<'de> Deserialize<'de> for SearchRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawSearchRequest::deserialize(deserializer)?;
        Ok(Self {
            query: raw.query,
            size: raw.size,
            from: raw.from,
            sort: raw.sort,
            aggs: aggs::pick_aggregations(raw.aggs, raw.aggregations),
        })
    }
}

impl SearchRequest {
    /// Decode a request body. An empty body is a match-all request.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn limit(&self) -> usize {
        self.size.unwrap_or(DEFAULT_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(Error::Decode(format!("unknown sort order '{}'", other))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Deserialize)]
struct SortOptions {
    #[serde(default)]
    order: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    mode: Option<String>,
}

/// Either `"desc"` or `{"order": "desc"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum SortSpec {
    Order(String),
    Options(SortOptions),
}

/// Sort list. Items are `"field"`, `{"field": "desc"}` or
/// `{"field": {"order": "desc"}}`; an object item may name several fields.
fn deserialize_sort<'de, D>(deserializer: D) -> std::result::Result<Vec<SortEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SortItems;

    impl<'de> Visitor<'de> for SortItems {
        type Value = Vec<SortEntry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of sort fields")
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some(item) = seq.next_element::<SortItem>()? {
                entries.extend(item.0);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(SortItems)
}

struct SortItem(Vec<SortEntry>);

impl<'de> Deserialize<'de> for SortItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ItemVisitor;

        impl<'de> Visitor<'de> for ItemVisitor {
            type Value = SortItem;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a field name or a field-to-order object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<SortItem, E> {
                Ok(SortItem(vec![SortEntry {
                    field: v.to_string(),
                    direction: SortDirection::Asc,
                }]))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<SortItem, A::Error> {
                let mut entries = Vec::new();
                while let Some((field, spec)) = map.next_entry::<String, SortSpec>()? {
                    let order = match spec {
                        SortSpec::Order(o) => Some(o),
                        SortSpec::Options(opts) => opts.order,
                    };
                    let direction = match order {
                        Some(o) => SortDirection::parse(&o).map_err(de::Error::custom)?,
                        None => SortDirection::Asc,
                    };
                    entries.push(SortEntry { field, direction });
                }
                Ok(SortItem(entries))
            }
        }

        deserializer.deserialize_any(ItemVisitor)
    }
}
