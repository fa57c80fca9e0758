//! Index Templates
//!
//! A template maps an index-name pattern to the set of document fields that
//! hold dates and the external format each one uses. The compiler consults
//! it for range bounds, the document adapter for writes and reads.
//!
//! Templates are looked up far more often than they are registered, so the
//! registry publishes an immutable snapshot and registration swaps in a new
//! one. A lookup never sees a half-applied registration.

pub mod matcher;
pub mod types;

pub use matcher::{translate_pattern, IndexPattern};
pub use types::{CreateTemplateRequest, FieldMapping, TemplateMapping, DATE_TYPE};

use crate::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct RegisteredTemplate {
    name: String,
    pattern: IndexPattern,
    mapping: Arc<TemplateMapping>,
}

/// Registry of templates, in registration order
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    snapshot: RwLock<Arc<Vec<RegisteredTemplate>>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the template `name`.
    ///
    /// `index_pattern` is the raw client pattern; `*` is translated here.
    /// Non-date properties are dropped. Replacing a template keeps its
    /// original registration position.
    pub fn register(
        &self,
        name: &str,
        index_pattern: &str,
        properties: BTreeMap<String, FieldMapping>,
    ) -> Result<Arc<TemplateMapping>> {
        let translated = translate_pattern(index_pattern);
        self.insert(name, TemplateMapping::new(translated, properties))
    }

    /// Register a mapping whose pattern has already been translated, as read
    /// back from storage.
    pub fn restore(&self, name: &str, mapping: TemplateMapping) -> Result<Arc<TemplateMapping>> {
        self.insert(name, mapping)
    }

    fn insert(&self, name: &str, mapping: TemplateMapping) -> Result<Arc<TemplateMapping>> {
        let pattern = IndexPattern::compile(&mapping.index_patterns)?;
        let mapping = Arc::new(mapping);
        let entry = RegisteredTemplate {
            name: name.to_string(),
            pattern,
            mapping: mapping.clone(),
        };

        let mut guard = self.snapshot.write();
        let mut next: Vec<RegisteredTemplate> = guard.as_ref().clone();
        match next.iter_mut().find(|t| t.name == name) {
            Some(existing) => *existing = entry,
            None => next.push(entry),
        }
        *guard = Arc::new(next);

        Ok(mapping)
    }

    /// First template, in registration order, whose pattern matches `index_name`.
    pub fn lookup(&self, index_name: &str) -> Option<Arc<TemplateMapping>> {
        let snapshot = self.snapshot.read().clone();
        snapshot
            .iter()
            .find(|t| t.pattern.matches(index_name))
            .map(|t| t.mapping.clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<TemplateMapping>> {
        self.snapshot
            .read()
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.mapping.clone())
    }

    /// All templates as `(name, mapping)`, in registration order.
    pub fn list(&self) -> Vec<(String, Arc<TemplateMapping>)> {
        self.snapshot
            .read()
            .iter()
            .map(|t| (t.name.clone(), t.mapping.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
