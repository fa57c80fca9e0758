//! Template pattern matching
//!
//! Index patterns only understand `*`. It is rewritten to `.*` and the rest
//! of the pattern is handed to the regex engine as written, so other regex
//! metacharacters keep their regex meaning. Matching is unanchored.

use crate::{Error, Result};
use regex::Regex;

/// Rewrite an index pattern into regex source.
pub fn translate_pattern(pattern: &str) -> String {
    pattern.replace('*', ".*")
}

/// A translated pattern with its compiled regex
#[derive(Debug, Clone)]
pub struct IndexPattern {
    source: String,
    regex: Regex,
}

impl IndexPattern {
    /// Compile an already-translated pattern.
    pub fn compile(translated: &str) -> Result<Self> {
        let regex = Regex::new(translated).map_err(|e| {
            Error::Template(format!("invalid index pattern '{}': {}", translated, e))
        })?;
        Ok(Self {
            source: translated.to_string(),
            regex,
        })
    }

    pub fn matches(&self, index_name: &str) -> bool {
        self.regex.is_match(index_name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
