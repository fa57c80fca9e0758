//! Rebuild aggregation results from the rows of an executed plan node

use super::types::{AggregationResult, Bucket, SubAggregateValue};
use crate::plan::{AggregateDef, NodeKind, PlanNode};
use crate::storage::{Row, ScalarValue};
use crate::{Error, Result};

/// Consume an aggregation node and its rows, returning `(label, result)`.
pub fn assemble(node: PlanNode, rows: &[Row]) -> Result<(String, AggregationResult)> {
    let key_alias = node.group_aliases().first().map(|(alias, _)| alias.clone());
    let fn_aliases = node.fn_aliases().to_vec();

    let (label, mut result) = match node.into_kind() {
        NodeKind::Aggregation { label, result } => (label, result),
        NodeKind::Hits => {
            return Err(Error::RowShape(
                "hits node does not produce an aggregation".to_string(),
            ))
        }
    };

    match &mut result {
        AggregationResult::Bucket(agg) => {
            let key_alias = key_alias.ok_or_else(|| {
                Error::RowShape(format!("bucket aggregation '{}' has no group column", label))
            })?;
            for row in rows {
                agg.buckets.push(bucket_from_row(row, &key_alias, &fn_aliases)?);
            }
        }
        AggregationResult::MetricSingle(metric) => {
            let row = match rows {
                [row] => row,
                _ => {
                    return Err(Error::RowShape(format!(
                        "metric aggregation '{}' expected one row, got {}",
                        label,
                        rows.len()
                    )))
                }
            };
            let value = match fn_aliases.first() {
                Some((alias, _)) => column(row, alias)?,
                None => row.first().ok_or_else(|| {
                    Error::RowShape(format!("metric aggregation '{}' returned no columns", label))
                })?,
            };
            metric.value = value.to_json();
        }
        AggregationResult::MetricMultiple(_) => {}
    }

    Ok((label, result))
}

fn bucket_from_row(row: &Row, key_alias: &str, fn_aliases: &[(String, AggregateDef)]) -> Result<Bucket> {
    let mut bucket = Bucket {
        key: column(row, key_alias)?.to_key(),
        ..Bucket::default()
    };

    for (alias, def) in fn_aliases {
        let value = column(row, alias)?;
        if def.is_bucket() {
            bucket.doc_count = value.as_i64().unwrap_or(0);
        } else {
            bucket.sub_aggregations.insert(
                def.field().to_string(),
                SubAggregateValue::new(value.to_json()),
            );
        }
    }
    Ok(bucket)
}

fn column<'r>(row: &'r Row, alias: &str) -> Result<&'r ScalarValue> {
    row.get(alias)
        .ok_or_else(|| Error::RowShape(format!("result row is missing column '{}'", alias)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::SearchRequest;
    use crate::plan::compile;
    use serde_json::json;

    fn node(v: serde_json::Value) -> PlanNode {
        let req = SearchRequest::from_value(v).unwrap();
        compile("idx", &req).unwrap().remove(0)
    }

    fn row(cols: &[(&str, ScalarValue)]) -> Row {
        Row::new(cols.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn test_terms_buckets_in_row_order() {
        let n = node(json!({"aggs": {"by_code": {"terms": {"field": "code"}}}}));
        let rows = vec![
            row(&[("g1", ScalarValue::Text("api".into())), ("f1", ScalarValue::Integer(3))]),
            row(&[("g1", ScalarValue::Integer(404)), ("f1", ScalarValue::Integer(2))]),
            row(&[("g1", ScalarValue::Null), ("f1", ScalarValue::Integer(1))]),
        ];

        let (label, result) = assemble(n, &rows).unwrap();
        assert_eq!(label, "by_code");
        let buckets = &result.as_buckets().unwrap().buckets;
        let got: Vec<(&str, i64)> = buckets.iter().map(|b| (b.key.as_str(), b.doc_count)).collect();
        assert_eq!(got, vec![("api", 3), ("404", 2), ("", 1)]);
    }

    #[test]
    fn test_sub_aggregate_named_after_field() {
        let n = node(json!({"aggs": {"by_service": {
            "terms": {"field": "service"},
            "aggs": {"avg_duration": {"avg": {"field": "duration"}}}
        }}}));
        let rows = vec![row(&[
            ("g1", ScalarValue::Text("api".into())),
            ("f1", ScalarValue::Integer(2)),
            ("f2", ScalarValue::Float(15.5)),
        ])];

        let (_, result) = assemble(n, &rows).unwrap();
        let bucket = &result.as_buckets().unwrap().buckets[0];
        assert_eq!(bucket.doc_count, 2);
        assert_eq!(bucket.sub_aggregations["duration"].value, json!(15.5));
        assert_eq!(
            serde_json::to_value(bucket).unwrap(),
            json!({
                "key": "api",
                "doc_count": 2,
                "duration": {"value": 15.5, "value_as_string": "n/a"}
            })
        );
    }

    #[test]
    fn test_metric_single_row() {
        let n = node(json!({"aggs": {"max_d": {"max": {"field": "duration"}}}}));
        let (_, result) = assemble(n, &[row(&[("f1", ScalarValue::Integer(99))])]).unwrap();
        assert_eq!(result.as_metric().unwrap().value, json!(99));
    }

    #[test]
    fn test_metric_requires_one_row() {
        let n = node(json!({"aggs": {"max_d": {"max": {"field": "duration"}}}}));
        assert!(matches!(assemble(n, &[]), Err(Error::RowShape(_))));
    }

    #[test]
    fn test_missing_column_is_row_shape_error() {
        let n = node(json!({"aggs": {"by_code": {"terms": {"field": "code"}}}}));
        let rows = vec![row(&[("g1", ScalarValue::Text("a".into()))])];
        assert!(matches!(assemble(n, &rows), Err(Error::RowShape(_))));
    }

    #[test]
    fn test_hits_node_rejected() {
        let req = SearchRequest::default();
        let hits = compile("idx", &req).unwrap().remove(0);
        assert!(matches!(assemble(hits, &[]), Err(Error::RowShape(_))));
    }
}
