//! WHERE predicates from a query

use super::sql::{json_field, quote_literal, scalar_literal};
use crate::date::{DateFormat, DEFAULT_RANGE_FORMAT};
use crate::dsl::{Clause, Query, RangeParams};
use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// Conjunctive predicates for `query`. No query, or a query with nothing
/// compilable, yields no predicates.
pub(crate) fn compile_query(query: Option<&Query>) -> Result<Vec<String>> {
    let mut predicates = Vec::new();
    if let Some(q) = query {
        compile_clause(q, &mut predicates)?;
    }
    Ok(predicates)
}

fn compile_clause(query: &Query, out: &mut Vec<String>) -> Result<()> {
    match query.clause() {
        // should and filter do not contribute
        Clause::Bool(b) => {
            for q in &b.must {
                compile_clause(q, out)?;
            }
        }
        Clause::Term(fields) => {
            for (field, v) in fields {
                out.push(equality(field, &v.value));
            }
        }
        Clause::Match(fields) => {
            for (field, v) in fields {
                out.push(equality(field, &v.query));
            }
        }
        Clause::Range(fields) => compile_range(fields, out)?,
        Clause::MatchAll => {}
    }
    Ok(())
}

fn equality(field: &str, value: &str) -> String {
    format!("{} = {}", json_field(None, field), scalar_literal(value))
}

/// Only the first field of a multi-field range is compiled.
fn compile_range(fields: &BTreeMap<String, RangeParams>, out: &mut Vec<String>) -> Result<()> {
    let Some((field, params)) = fields.iter().next() else {
        return Ok(());
    };

    let format = DateFormat::from_name(params.format.as_deref().unwrap_or(DEFAULT_RANGE_FORMAT));
    let target = format!("DATETIME({})", json_field(None, field));

    for (op, bound) in [params.upper(), params.lower()].into_iter().flatten() {
        let literal = match format.to_canonical(&bound.to_value())? {
            Value::String(s) => s,
            other => other.to_string(),
        };
        out.push(format!(
            "{} {} DATETIME({})",
            target,
            op.as_sql(),
            quote_literal(&literal)
        ));
    }
    Ok(())
}
