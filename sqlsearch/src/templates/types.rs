//! Template type definitions

use crate::date::DateFormat;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Field type that triggers date conversion
pub const DATE_TYPE: &str = "date";

/// A single field declaration inside `mappings.properties`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "type", default)]
    pub field_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
}

impl FieldMapping {
    pub fn date(format: impl Into<String>) -> Self {
        Self {
            field_type: DATE_TYPE.to_string(),
            format: format.into(),
        }
    }

    pub fn is_date(&self) -> bool {
        self.field_type == DATE_TYPE
    }
}

/// A registered template: which fields of matching indexes are dates, and
/// in which external format clients expect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMapping {
    /// Pattern after `*` translation, as matched against index names
    pub index_patterns: String,

    /// Date fields only
    pub properties: BTreeMap<String, FieldMapping>,
}

impl TemplateMapping {
    /// Build a mapping, dropping every property that is not a date.
    pub fn new(index_pattern: impl Into<String>, properties: BTreeMap<String, FieldMapping>) -> Self {
        Self {
            index_patterns: index_pattern.into(),
            properties: properties
                .into_iter()
                .filter(|(_, field)| field.is_date())
                .collect(),
        }
    }

    /// Date format for `field`, if the template marks it as a date.
    pub fn date_format(&self, field: &str) -> Option<DateFormat> {
        self.properties
            .get(field)
            .map(|f| DateFormat::from_name(&f.format))
    }

    pub fn date_fields(&self) -> impl Iterator<Item = (&str, DateFormat)> {
        self.properties
            .iter()
            .map(|(name, f)| (name.as_str(), DateFormat::from_name(&f.format)))
    }
}

/// Body of a template creation request.
///
/// ```json
/// {
///   "index_patterns": "*jaeger-span-*",
///   "mappings": {
///     "properties": {
///       "startTimeMillis": {"type": "date", "format": "epoch_millis"}
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateRequest {
    /// A string, or an array whose first entry is used
    #[serde(deserialize_with = "first_pattern")]
    pub index_patterns: String,

    #[serde(default)]
    pub settings: Option<serde_json::Value>,

    #[serde(default)]
    pub mappings: TemplateMappings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateMappings {
    #[serde(default)]
    pub properties: BTreeMap<String, FieldMapping>,
}

fn first_pattern<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Patterns {
        One(String),
        Many(Vec<String>),
    }

    match Patterns::deserialize(deserializer)? {
        Patterns::One(p) => Ok(p),
        Patterns::Many(list) => list
            .into_iter()
            .next()
            .ok_or_else(|| serde::de::Error::custom("index_patterns must not be empty")),
    }
}
