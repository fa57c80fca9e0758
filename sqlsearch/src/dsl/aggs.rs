//! Aggregation definitions

use super::shorthand::opt_scalar_text;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Aggregations by label
pub type Aggregations = BTreeMap<String, Aggregate>;

/// Result category used to pick the container an aggregation fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationCategory {
    MetricsSingle,
    MetricsMultiple,
    Bucket,
}

/// An aggregation definition, possibly with nested sub-aggregations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub terms: Option<TermsAgg>,
    pub date_histogram: Option<DateHistogramAgg>,
    pub avg: Option<FieldAgg>,
    pub max: Option<FieldAgg>,
    pub aggs: Aggregations,
}

/// The single variant an [`Aggregate`] defines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateKind<'a> {
    Terms(&'a TermsAgg),
    DateHistogram(&'a DateHistogramAgg),
    Avg(&'a FieldAgg),
    Max(&'a FieldAgg),
}

impl AggregateKind<'_> {
    pub fn field(&self) -> &str {
        match self {
            AggregateKind::Terms(t) => &t.field,
            AggregateKind::DateHistogram(d) => &d.field,
            AggregateKind::Avg(f) | AggregateKind::Max(f) => &f.field,
        }
    }

    pub fn is_bucket(&self) -> bool {
        matches!(self, AggregateKind::Terms(_) | AggregateKind::DateHistogram(_))
    }
}

impl Aggregate {
    /// The variant this aggregate defines. Exactly one must be set.
    pub fn kind(&self) -> Result<AggregateKind<'_>> {
        let mut set = Vec::with_capacity(1);
        if let Some(t) = &self.terms {
            set.push(AggregateKind::Terms(t));
        }
        if let Some(d) = &self.date_histogram {
            set.push(AggregateKind::DateHistogram(d));
        }
        if let Some(a) = &self.avg {
            set.push(AggregateKind::Avg(a));
        }
        if let Some(m) = &self.max {
            set.push(AggregateKind::Max(m));
        }

        match set.len() {
            1 => Ok(set[0]),
            0 => Err(Error::Compile(
                "aggregation defines none of terms, date_histogram, avg, max".to_string(),
            )),
            n => Err(Error::Compile(format!(
                "aggregation defines {} aggregation types, expected one",
                n
            ))),
        }
    }

    /// Avg/Max are checked first, then terms. `date_histogram` has no
    /// category here even though it compiles as a bucket aggregation.
    pub fn category(&self) -> Option<AggregationCategory> {
        if self.avg.is_some() || self.max.is_some() {
            Some(AggregationCategory::MetricsSingle)
        } else if self.terms.is_some() {
            Some(AggregationCategory::Bucket)
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct RawAggregate {
    #[serde(default)]
    terms: Option<TermsAgg>,
    #[serde(default)]
    date_histogram: Option<DateHistogramAgg>,
    #[serde(default)]
    avg: Option<FieldAgg>,
    #[serde(default)]
    max: Option<FieldAgg>,
    #[serde(default)]
    aggs: Option<Aggregations>,
    #[serde(default)]
    aggregations: Option<Aggregations>,
}

impl<'de> Deserialize<'de> for Aggregate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawAggregate::deserialize(deserializer)?;
        Ok(Self {
            terms: raw.terms,
            date_histogram: raw.date_histogram,
            avg: raw.avg,
            max: raw.max,
            aggs: pick_aggregations(raw.aggs, raw.aggregations),
        })
    }
}

/// `aggregations` wins over `aggs` when it is non-empty; the two are never merged.
pub(crate) fn pick_aggregations(
    aggs: Option<Aggregations>,
    aggregations: Option<Aggregations>,
) -> Aggregations {
    match aggregations {
        Some(a) if !a.is_empty() => a,
        _ => aggs.unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TermsAgg {
    pub field: String,
    #[serde(default)]
    pub size: Option<usize>,
}

/// Interval settings are accepted but buckets are keyed by the raw field value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DateHistogramAgg {
    pub field: String,
    #[serde(default)]
    pub buckets: Option<usize>,
    #[serde(default)]
    pub fixed_interval: Option<String>,
    #[serde(default)]
    pub calendar_interval: Option<String>,
}

/// Single-field metric (`avg`, `max`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldAgg {
    pub field: String,
    #[serde(default, deserialize_with = "opt_scalar_text")]
    pub missing: Option<String>,
}
