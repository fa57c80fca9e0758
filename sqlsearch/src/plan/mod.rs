//! Query compiler
//!
//! [`compile`] turns a [`SearchRequest`] into an ordered list of
//! [`PlanNode`]s: one per top-level aggregation, then a single hits node.
//! Each node carries one SELECT statement and the alias bookkeeping the
//! assembler needs to read its rows back.
//!
//! Aliases are per node: group columns are `g1, g2, ...` and function
//! columns `f1, f2, ...`. A metric sub-aggregation under a bucket aggregation
//! is compiled as its own node and spliced into the parent's select list as
//! a scalar subquery, correlated to the parent's group key:
//!
//! ```sql
//! SELECT JSON_EXTRACT(content, '$.service') AS g1, COUNT(*) AS f1,
//!        (SELECT AVG(JSON_EXTRACT(content, '$.duration')) AS f1 FROM "spans"
//!         WHERE JSON_EXTRACT(content, '$.service') = JSON_EXTRACT(t0.content, '$.service')) AS f2
//! FROM "spans" AS t0 WHERE 1 = 1 GROUP BY g1
//! ```

mod predicate;
pub mod sql;

use crate::aggregations::{
    AggregationResult, BucketAggregation, MetricSingleAggregation,
};
use crate::dsl::{Aggregate, AggregateKind, FieldAgg, SearchRequest};
use crate::{Error, Result};
use sql::{json_field, scalar_literal, SelectBuilder};

/// Table alias of an aggregation node that has correlated sub-aggregations
pub const OUTER_ALIAS: &str = "t0";

/// Column aliases of the hits node
pub const HITS_ID_COLUMN: &str = "id";
pub const HITS_CONTENT_COLUMN: &str = "content";

/// The aggregate definition a column alias was generated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateDef {
    Terms { field: String },
    DateHistogram { field: String },
    Avg { field: String },
    Max { field: String },
}

impl AggregateDef {
    pub fn field(&self) -> &str {
        match self {
            Self::Terms { field }
            | Self::DateHistogram { field }
            | Self::Avg { field }
            | Self::Max { field } => field,
        }
    }

    pub fn is_bucket(&self) -> bool {
        matches!(self, Self::Terms { .. } | Self::DateHistogram { .. })
    }
}

impl From<AggregateKind<'_>> for AggregateDef {
    fn from(kind: AggregateKind<'_>) -> Self {
        let field = kind.field().to_string();
        match kind {
            AggregateKind::Terms(_) => Self::Terms { field },
            AggregateKind::DateHistogram(_) => Self::DateHistogram { field },
            AggregateKind::Avg(_) => Self::Avg { field },
            AggregateKind::Max(_) => Self::Max { field },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Fills the result container for `label`
    Aggregation {
        label: String,
        result: AggregationResult,
    },
    /// Selects matching documents
    Hits,
}

/// One compiled statement and its bookkeeping
#[derive(Debug, Clone)]
pub struct PlanNode {
    kind: NodeKind,
    builder: SelectBuilder,
    select_aliases: Vec<String>,
    group_aliases: Vec<(String, AggregateDef)>,
    fn_aliases: Vec<(String, AggregateDef)>,
}

impl PlanNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            builder: SelectBuilder::new(),
            select_aliases: Vec::new(),
            group_aliases: Vec::new(),
            fn_aliases: Vec::new(),
        }
    }

    fn aggregation(label: &str) -> Self {
        Self::new(NodeKind::Aggregation {
            label: label.to_string(),
            result: AggregationResult::MetricSingle(MetricSingleAggregation::default()),
        })
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn into_kind(self) -> NodeKind {
        self.kind
    }

    pub fn is_hits(&self) -> bool {
        matches!(self.kind, NodeKind::Hits)
    }

    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Aggregation { label, .. } => Some(label),
            NodeKind::Hits => None,
        }
    }

    /// Render the statement
    pub fn sql(&self) -> String {
        self.builder.build()
    }

    pub fn select_aliases(&self) -> &[String] {
        &self.select_aliases
    }

    pub fn group_aliases(&self) -> &[(String, AggregateDef)] {
        &self.group_aliases
    }

    pub fn fn_aliases(&self) -> &[(String, AggregateDef)] {
        &self.fn_aliases
    }

    fn next_group_alias(&self) -> String {
        format!("g{}", self.group_aliases.len() + 1)
    }

    fn next_fn_alias(&self) -> String {
        format!("f{}", self.fn_aliases.len() + 1)
    }

    fn add_column(&mut self, expr: &str, alias: &str) {
        self.builder.select_as(expr, alias);
        self.select_aliases.push(alias.to_string());
    }

    fn set_result(&mut self, container: AggregationResult) {
        if let NodeKind::Aggregation { result, .. } = &mut self.kind {
            *result = container;
        }
    }

    fn apply_predicates(&mut self, predicates: &[String]) {
        for p in predicates {
            self.builder.and_where(p.as_str());
        }
    }

    /// Compile `agg` into this node's select list.
    fn compile_aggregate(
        &mut self,
        index: &str,
        agg: &Aggregate,
        predicates: &[String],
    ) -> Result<()> {
        let kind = agg.kind()?;
        let def = AggregateDef::from(kind);
        let group_alias = self.next_group_alias();
        let fn_alias = self.next_fn_alias();

        match kind {
            AggregateKind::Terms(_) | AggregateKind::DateHistogram(_) => {
                self.add_column(&json_field(None, kind.field()), &group_alias);
                self.group_aliases.push((group_alias.clone(), def.clone()));
                self.add_column("COUNT(*)", &fn_alias);
                self.fn_aliases.push((fn_alias.clone(), def));
                self.set_result(AggregationResult::Bucket(BucketAggregation::default()));

                if let AggregateKind::Terms(terms) = kind {
                    self.builder.order_by(&fn_alias, "DESC").order_by(&group_alias, "ASC");
                    if let Some(size) = terms.size {
                        self.builder.limit(size);
                    }
                } else {
                    self.builder.order_by(&group_alias, "ASC");
                }
            }
            AggregateKind::Avg(field) => {
                self.add_column(&format!("AVG({})", metric_input(field)), &fn_alias);
                self.fn_aliases.push((fn_alias, def));
                self.set_result(AggregationResult::MetricSingle(
                    MetricSingleAggregation::default(),
                ));
            }
            AggregateKind::Max(field) => {
                self.add_column(&format!("MAX({})", metric_input(field)), &fn_alias);
                self.fn_aliases.push((fn_alias, def));
                self.set_result(AggregationResult::MetricSingle(
                    MetricSingleAggregation::default(),
                ));
            }
        }

        for (sub_label, sub) in &agg.aggs {
            if !kind.is_bucket() {
                return Err(Error::Compile(format!(
                    "sub-aggregation '{}' needs a terms or date_histogram parent",
                    sub_label
                )));
            }
            if sub.kind()?.is_bucket() {
                return Err(Error::Compile(format!(
                    "bucket sub-aggregation '{}' under a bucket aggregation is not supported",
                    sub_label
                )));
            }

            let mut child = PlanNode::aggregation(sub_label);
            child.compile_aggregate(index, sub, predicates)?;
            child.builder.from_table(index, None);
            child.apply_predicates(predicates);
            child.builder.and_where(format!(
                "{} = {}",
                json_field(None, kind.field()),
                json_field(Some(OUTER_ALIAS), kind.field())
            ));

            let spliced = self.next_fn_alias();
            self.add_column(&format!("({})", child.sql()), &spliced);
            for (_, child_def) in child.fn_aliases {
                self.fn_aliases.push((spliced.clone(), child_def));
            }
        }

        Ok(())
    }
}

/// Extracted metric field, with `missing` substituted for absent values
fn metric_input(field: &FieldAgg) -> String {
    let extract = json_field(None, &field.field);
    match &field.missing {
        Some(missing) => format!("COALESCE({}, {})", extract, scalar_literal(missing)),
        None => extract,
    }
}

/// Compile `request` against the table `index`.
pub fn compile(index: &str, request: &SearchRequest) -> Result<Vec<PlanNode>> {
    let predicates = predicate::compile_query(request.query.as_ref())?;
    let mut plan = Vec::with_capacity(request.aggs.len() + 1);

    for (label, agg) in &request.aggs {
        let mut node = PlanNode::aggregation(label);
        node.compile_aggregate(index, agg, &predicates)?;

        let alias = (!agg.aggs.is_empty()).then_some(OUTER_ALIAS);
        node.builder.from_table(index, alias);
        node.apply_predicates(&predicates);

        let groups: Vec<String> = node.group_aliases.iter().map(|(a, _)| a.clone()).collect();
        for g in &groups {
            node.builder.group_by(g);
        }
        plan.push(node);
    }

    let mut hits = PlanNode::new(NodeKind::Hits);
    hits.add_column("rowid", HITS_ID_COLUMN);
    hits.add_column("JSON(content)", HITS_CONTENT_COLUMN);
    hits.builder.from_table(index, None);
    hits.apply_predicates(&predicates);
    for entry in &request.sort {
        hits.builder
            .order_by(&json_field(None, &entry.field), entry.direction.as_sql());
    }
    hits.builder.limit(request.limit());
    if let Some(from) = request.from {
        hits.builder.offset(from);
    }
    plan.push(hits);

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(v: serde_json::Value) -> Vec<PlanNode> {
        let req = SearchRequest::from_value(v).unwrap();
        compile("idx", &req).unwrap()
    }

    #[test]
    fn test_match_all_hits_only() {
        let nodes = plan(json!({}));
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_hits());
        assert_eq!(
            nodes[0].sql(),
            "SELECT rowid AS id, JSON(content) AS content FROM \"idx\" WHERE 1 = 1 LIMIT 10"
        );
    }

    #[test]
    fn test_hits_sort_size_from() {
        let nodes = plan(json!({
            "query": {"term": {"level": "error"}},
            "sort": [{"ts": {"order": "desc"}}, "host.keyword"],
            "size": 5,
            "from": 10
        }));
        assert_eq!(
            nodes[0].sql(),
            "SELECT rowid AS id, JSON(content) AS content FROM \"idx\" \
             WHERE JSON_EXTRACT(content, '$.level') = 'error' \
             ORDER BY JSON_EXTRACT(content, '$.ts') DESC, JSON_EXTRACT(content, '$.host') ASC \
             LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn test_one_node_per_aggregation_then_hits() {
        let nodes = plan(json!({
            "aggs": {
                "by_service": {"terms": {"field": "service.keyword"}},
                "max_duration": {"max": {"field": "duration"}}
            }
        }));
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].label(), Some("by_service"));
        assert_eq!(nodes[1].label(), Some("max_duration"));
        assert!(nodes[2].is_hits());
    }

    #[test]
    fn test_terms_node_shape() {
        let nodes = plan(json!({
            "query": {"match": {"env": "prod"}},
            "aggs": {"by_service": {"terms": {"field": "service.keyword"}}}
        }));
        let node = &nodes[0];
        assert_eq!(
            node.sql(),
            "SELECT JSON_EXTRACT(content, '$.service') AS g1, COUNT(*) AS f1 FROM \"idx\" \
             WHERE JSON_EXTRACT(content, '$.env') = 'prod' GROUP BY g1 ORDER BY f1 DESC, g1 ASC"
        );
        assert_eq!(node.select_aliases(), ["g1", "f1"]);
        assert_eq!(node.group_aliases()[0].0, "g1");
        assert!(matches!(
            node.kind(),
            NodeKind::Aggregation { result: AggregationResult::Bucket(_), .. }
        ));
    }

    #[test]
    fn test_terms_size_limits_buckets() {
        let nodes = plan(json!({"aggs": {"top": {"terms": {"field": "a", "size": 3}}}}));
        assert!(nodes[0].sql().ends_with("LIMIT 3"));
    }

    #[test]
    fn test_metric_node_shape() {
        let nodes = plan(json!({"aggs": {"avg_d": {"avg": {"field": "duration", "missing": 0}}}}));
        assert_eq!(
            nodes[0].sql(),
            "SELECT AVG(COALESCE(JSON_EXTRACT(content, '$.duration'), 0)) AS f1 FROM \"idx\" WHERE 1 = 1"
        );
        assert!(nodes[0].group_aliases().is_empty());
    }

    #[test]
    fn test_date_histogram_groups_raw_value() {
        let nodes = plan(json!({"aggs": {"over_time": {
            "date_histogram": {"field": "ts", "fixed_interval": "1h"}
        }}}));
        assert_eq!(
            nodes[0].sql(),
            "SELECT JSON_EXTRACT(content, '$.ts') AS g1, COUNT(*) AS f1 FROM \"idx\" \
             WHERE 1 = 1 GROUP BY g1 ORDER BY g1 ASC"
        );
    }

    #[test]
    fn test_nested_metric_correlated() {
        let nodes = plan(json!({
            "query": {"term": {"env": "prod"}},
            "aggs": {"by_service": {
                "terms": {"field": "service"},
                "aggs": {"avg_duration": {"avg": {"field": "duration"}}}
            }}
        }));
        let node = &nodes[0];
        assert_eq!(node.select_aliases(), ["g1", "f1", "f2"]);
        assert_eq!(
            node.fn_aliases()[1],
            ("f2".to_string(), AggregateDef::Avg { field: "duration".to_string() })
        );

        let sql = node.sql();
        assert!(sql.contains("FROM \"idx\" AS t0"));
        assert!(sql.contains(
            "(SELECT AVG(JSON_EXTRACT(content, '$.duration')) AS f1 FROM \"idx\" \
             WHERE JSON_EXTRACT(content, '$.env') = 'prod' \
             AND JSON_EXTRACT(content, '$.service') = JSON_EXTRACT(t0.content, '$.service')) AS f2"
        ));
    }

    #[test]
    fn test_bucket_under_bucket_rejected() {
        let req = SearchRequest::from_value(json!({"aggs": {"a": {
            "terms": {"field": "x"},
            "aggs": {"b": {"terms": {"field": "y"}}}
        }}}))
        .unwrap();
        assert!(matches!(compile("idx", &req), Err(Error::Compile(_))));
    }

    #[test]
    fn test_sub_aggregation_under_metric_rejected() {
        let req = SearchRequest::from_value(json!({"aggs": {"a": {
            "avg": {"field": "x"},
            "aggs": {"b": {"max": {"field": "y"}}}
        }}}))
        .unwrap();
        assert!(matches!(compile("idx", &req), Err(Error::Compile(_))));
    }

    #[test]
    fn test_empty_aggregate_rejected() {
        let req = SearchRequest::from_value(json!({"aggs": {"a": {}}})).unwrap();
        assert!(matches!(compile("idx", &req), Err(Error::Compile(_))));
    }

    #[test]
    fn test_table_name_quoted() {
        let req = SearchRequest::default();
        let nodes = compile("logs-2024.01", &req).unwrap();
        assert!(nodes[0].sql().contains("FROM \"logs-2024.01\""));
    }
}
