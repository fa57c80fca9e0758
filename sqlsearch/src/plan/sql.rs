//! SELECT statement builder for SQLite
//!
//! Identifiers are double-quoted and string literals single-quoted, with the
//! quote character doubled inside. Everything else is passed through.

use std::fmt::Write;

/// Name suffix clients use for exact-match subfields. Documents have no
/// subfields, so it is dropped from field paths.
pub const KEYWORD_SUFFIX: &str = ".keyword";

/// Quote an identifier (`my"table` → `"my""table"`).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal (`it's` → `'it''s'`).
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Strip a trailing `.keyword` from a field name.
pub fn normalize_field(field: &str) -> &str {
    field.strip_suffix(KEYWORD_SUFFIX).unwrap_or(field)
}

/// JSON extraction of `field` from the `content` column, optionally
/// qualified by a table alias.
pub fn json_field(qualifier: Option<&str>, field: &str) -> String {
    let path = format!("$.{}", normalize_field(field));
    match qualifier {
        Some(q) => format!("JSON_EXTRACT({}.content, {})", q, quote_literal(&path)),
        None => format!("JSON_EXTRACT(content, {})", quote_literal(&path)),
    }
}

/// Integer literals are emitted bare, everything else as a quoted string.
pub fn scalar_literal(value: &str) -> String {
    match value.parse::<i64>() {
        Ok(i) => i.to_string(),
        Err(_) => quote_literal(value),
    }
}

/// Builder for one SELECT statement
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    columns: Vec<String>,
    from: String,
    predicates: Vec<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `expr AS alias` to the select list.
    pub fn select_as(&mut self, expr: &str, alias: &str) -> &mut Self {
        self.columns.push(format!("{} AS {}", expr, alias));
        self
    }

    pub fn from_table(&mut self, table: &str, alias: Option<&str>) -> &mut Self {
        self.from = match alias {
            Some(a) => format!("{} AS {}", quote_ident(table), a),
            None => quote_ident(table),
        };
        self
    }

    /// Add a predicate; all predicates are conjoined.
    pub fn and_where(&mut self, predicate: impl Into<String>) -> &mut Self {
        self.predicates.push(predicate.into());
        self
    }

    pub fn group_by(&mut self, expr: &str) -> &mut Self {
        self.group_by.push(expr.to_string());
        self
    }

    pub fn order_by(&mut self, expr: &str, direction: &str) -> &mut Self {
        self.order_by.push(format!("{} {}", expr, direction));
        self
    }

    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: usize) -> &mut Self {
        self.offset = Some(n);
        self
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    /// Render the statement. With no predicates the WHERE clause is `1 = 1`.
    pub fn build(&self) -> String {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.columns.join(", "));
        let _ = write!(sql, " FROM {}", self.from);

        if self.predicates.is_empty() {
            sql.push_str(" WHERE 1 = 1");
        } else {
            let _ = write!(sql, " WHERE {}", self.predicates.join(" AND "));
        }

        if !self.group_by.is_empty() {
            let _ = write!(sql, " GROUP BY {}", self.group_by.join(", "));
        }
        if !self.order_by.is_empty() {
            let _ = write!(sql, " ORDER BY {}", self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {}", limit);
            if let Some(offset) = self.offset.filter(|o| *o > 0) {
                let _ = write!(sql, " OFFSET {}", offset);
            }
        }
        sql
    }
}
