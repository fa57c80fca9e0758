//! Search engine: runs compiled plans against a document store

use crate::aggregations::assemble;
use crate::document::{read_document, write_document};
use crate::dsl::SearchRequest;
use crate::plan::{compile, HITS_CONTENT_COLUMN, HITS_ID_COLUMN};
use crate::response::{Document, SearchResponse};
use crate::storage::{DocumentStore, Row};
use crate::templates::{CreateTemplateRequest, TemplateMapping, TemplateRegistry};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Document count of one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub name: String,
    pub docs_count: u64,
}

/// Check that `name` can be used as an index (table) name.
///
/// Allowed: ASCII letters, digits, `_`, `.` and `-`, not starting with `_`.
pub fn validate_index_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if name.is_empty() || !valid_chars || name.starts_with('_') {
        return Err(Error::InvalidIndexName(name.to_string()));
    }
    Ok(())
}

pub struct SearchEngine {
    store: Arc<dyn DocumentStore>,
    templates: TemplateRegistry,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            templates: TemplateRegistry::new(),
        }
    }

    /// Create an engine and load the templates persisted in `store`.
    pub async fn open(store: Arc<dyn DocumentStore>) -> Result<Self> {
        let engine = Self::new(store);
        let loaded = engine.reload_templates().await?;
        info!("Loaded {} templates from storage", loaded);
        Ok(engine)
    }

    pub async fn reload_templates(&self) -> Result<usize> {
        let stored = self.store.load_templates().await?;
        let count = stored.len();
        for (name, mapping) in stored {
            self.templates.restore(&name, mapping)?;
        }
        Ok(count)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Decode `body` and search `index`.
    pub async fn search_body(&self, index: &str, body: &[u8]) -> Result<SearchResponse> {
        let request = SearchRequest::from_slice(body)?;
        self.search(index, &request).await
    }

    /// Compile `request` and run its plan, nodes in order.
    pub async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();
        validate_index_name(index)?;

        // Compile errors surface before anything runs
        let plan = compile(index, request)?;

        if !self.store.table_exists(index).await? {
            return Err(Error::IndexNotFound(index.to_string()));
        }

        let template = self.templates.lookup(index);
        let mut documents = Vec::new();
        let mut aggregations = BTreeMap::new();

        for node in plan {
            let sql = node.sql();
            debug!(index = %index, node = node.label().unwrap_or("hits"), sql = %sql, "Executing statement");
            let rows = self.store.execute(&sql).await?;

            if node.is_hits() {
                for row in &rows {
                    documents.push(hit_from_row(index, row, template.as_deref())?);
                }
            } else {
                let (label, result) = assemble(node, &rows)?;
                aggregations.insert(label, result);
            }
        }

        Ok(SearchResponse::new(
            start.elapsed().as_millis() as u64,
            documents,
            aggregations,
        ))
    }

    /// Create `index` if needed. Returns `true` when it was created.
    pub async fn create_index(&self, index: &str) -> Result<bool> {
        validate_index_name(index)?;
        if self.store.table_exists(index).await? {
            return Ok(false);
        }
        self.store.create_table(index).await?;
        info!("Created index '{}'", index);
        Ok(true)
    }

    /// Store `document` in `index`, creating the index when missing.
    /// Returns the new document id.
    pub async fn index_document(&self, index: &str, document: Value) -> Result<i64> {
        if !document.is_object() {
            return Err(Error::Decode("document must be a JSON object".to_string()));
        }
        self.create_index(index).await?;

        let template = self.templates.lookup(index);
        let stored = write_document(document, template.as_deref())?;
        let payload = serde_json::to_string(&stored)?;
        self.store.insert(index, &payload).await
    }

    /// Register and persist a template.
    pub async fn put_template(
        &self,
        name: &str,
        request: CreateTemplateRequest,
    ) -> Result<Arc<TemplateMapping>> {
        let mapping =
            self.templates
                .register(name, &request.index_patterns, request.mappings.properties)?;
        self.store.save_template(name, &mapping).await?;
        info!(
            "Registered template '{}' for pattern '{}' with {} date fields",
            name,
            mapping.index_patterns,
            mapping.properties.len()
        );
        Ok(mapping)
    }

    pub async fn list_indices(&self) -> Result<Vec<IndexStats>> {
        let mut stats = Vec::new();
        for name in self.store.list_tables().await? {
            let docs_count = self.store.count(&name).await?;
            stats.push(IndexStats { name, docs_count });
        }
        Ok(stats)
    }
}

fn hit_from_row(index: &str, row: &Row, template: Option<&TemplateMapping>) -> Result<Document> {
    let id = row
        .get(HITS_ID_COLUMN)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::RowShape(format!("hit row has no '{}' column", HITS_ID_COLUMN)))?;
    let content = row
        .get(HITS_CONTENT_COLUMN)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::RowShape(format!("hit row has no '{}' column", HITS_CONTENT_COLUMN))
        })?;

    let stored: Value = serde_json::from_str(content)
        .map_err(|e| Error::Storage(format!("stored document {} is not JSON: {}", id, e)))?;
    let source = read_document(stored, template)?;
    Ok(Document::new(index, id, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_index_name() {
        assert!(validate_index_name("logs-2024.01_a").is_ok());
        assert!(validate_index_name("_internal").is_err());
        assert!(validate_index_name("").is_err());
        assert!(validate_index_name("bad name").is_err());
        assert!(validate_index_name("quote\"d").is_err());
    }
}
