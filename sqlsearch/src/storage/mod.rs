//! Document storage
//!
//! Every index is a table of `(rowid, content)` rows where `content` is the
//! JSON document. Statements reach into documents with SQLite's JSON1
//! functions. [`DocumentStore`] is the seam the engine talks to;
//! [`SqliteStore`] is the implementation.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::templates::TemplateMapping;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Reserved table holding template definitions
pub const TEMPLATES_TABLE: &str = "__templates";

/// A dynamically typed column value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    pub fn to_json(&self) -> Value {
        match self {
            ScalarValue::Null => Value::Null,
            ScalarValue::Integer(i) => Value::from(*i),
            ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScalarValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Text is returned as-is and integers in decimal; anything else is empty.
    pub fn to_key(&self) -> String {
        match self {
            ScalarValue::Text(s) => s.clone(),
            ScalarValue::Integer(i) => i.to_string(),
            _ => String::new(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(i) => Some(*i),
            ScalarValue::Float(f) => Some(*f as i64),
            ScalarValue::Text(s) => s.parse().ok(),
            ScalarValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One result row: column alias to value, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, ScalarValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, ScalarValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, alias: &str) -> Option<&ScalarValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, v)| v)
    }

    /// Value of the first column
    pub fn first(&self) -> Option<&ScalarValue> {
        self.columns.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Storage operations the search engine needs
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a read statement and collect every row
    async fn execute(&self, sql: &str) -> Result<Vec<Row>>;

    /// Insert a JSON document into `table`, returning its rowid
    async fn insert(&self, table: &str, document: &str) -> Result<i64>;

    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Create `table`; a no-op when it already exists
    async fn create_table(&self, table: &str) -> Result<()>;

    /// Document tables, excluding internal bookkeeping tables
    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn count(&self, table: &str) -> Result<u64>;

    /// Stored templates, in the order they were first saved
    async fn load_templates(&self) -> Result<Vec<(String, TemplateMapping)>>;

    /// Save a template, replacing any with the same name
    async fn save_template(&self, name: &str, mapping: &TemplateMapping) -> Result<()>;
}
