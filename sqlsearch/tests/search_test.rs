//! End-to-end search tests against an in-memory SQLite store.
//!
//! Each test builds an engine over `SqliteStore::in_memory()`, indexes a few
//! documents through the engine, and checks the assembled response.

use serde_json::{json, Value};
use sqlsearch::dsl::SearchRequest;
use sqlsearch::storage::{DocumentStore, SqliteStore};
use sqlsearch::templates::CreateTemplateRequest;
use sqlsearch::{Error, SearchEngine};
use std::sync::Arc;

fn engine() -> (Arc<SqliteStore>, SearchEngine) {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = SearchEngine::new(store.clone());
    (store, engine)
}

async fn index_all(engine: &SearchEngine, index: &str, docs: Vec<Value>) {
    for doc in docs {
        engine.index_document(index, doc).await.unwrap();
    }
}

async fn search(engine: &SearchEngine, index: &str, body: Value) -> Value {
    let request = SearchRequest::from_value(body).unwrap();
    let response = engine.search(index, &request).await.unwrap();
    serde_json::to_value(response).unwrap()
}

fn span_docs() -> Vec<Value> {
    vec![
        json!({"service": "api", "env": "prod", "duration": 10, "code": 200}),
        json!({"service": "api", "env": "prod", "duration": 20, "code": 500}),
        json!({"service": "web", "env": "prod", "duration": 5, "code": 200}),
        json!({"service": "db", "env": "dev", "duration": 40, "code": 200}),
        json!({"service": "api", "env": "dev", "duration": 1, "code": 404}),
    ]
}

#[tokio::test]
async fn test_match_all_returns_documents() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(&engine, "spans", json!({})).await;
    assert_eq!(v["hits"]["total"], json!(5));
    assert_eq!(v["hits"]["hits"][0]["_index"], json!("spans"));
    assert_eq!(v["hits"]["hits"][0]["_source"]["service"], json!("api"));
    assert!(v.get("aggregations").is_none());
}

#[tokio::test]
async fn test_term_fields_are_conjoined() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({"query": {"term": {"service": "api", "env": "prod"}}}),
    )
    .await;
    assert_eq!(v["hits"]["total"], json!(2));

    let v = search(
        &engine,
        "spans",
        json!({"query": {"bool": {"must": [
            {"match": {"service.keyword": "api"}},
            {"term": {"code": 404}}
        ]}}}),
    )
    .await;
    assert_eq!(v["hits"]["total"], json!(1));
    assert_eq!(v["hits"]["hits"][0]["_source"]["duration"], json!(1));
}

#[tokio::test]
async fn test_should_is_not_applied() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({"query": {"bool": {"should": {"term": {"service": "nothing"}}}}}),
    )
    .await;
    assert_eq!(v["hits"]["total"], json!(5));
}

#[tokio::test]
async fn test_sort_size_and_from() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({"sort": [{"duration": {"order": "desc"}}], "size": 2, "from": 1}),
    )
    .await;
    let durations: Vec<Value> = v["hits"]["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["_source"]["duration"].clone())
        .collect();
    assert_eq!(durations, vec![json!(20), json!(10)]);
}

#[tokio::test]
async fn test_terms_buckets_cover_all_documents() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({"size": 0, "aggs": {"services": {"terms": {"field": "service.keyword"}}}}),
    )
    .await;

    let buckets = v["aggregations"]["services"]["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 3);
    let total: i64 = buckets.iter().map(|b| b["doc_count"].as_i64().unwrap()).sum();
    assert_eq!(total, 5);
    assert_eq!(buckets[0], json!({"key": "api", "doc_count": 3}));
    assert_eq!(v["aggregations"]["services"]["doc_count_error_upper_bound"], json!(0));
    assert_eq!(v["hits"]["hits"], json!([]));
}

#[tokio::test]
async fn test_terms_respects_query() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({
            "query": {"term": {"env": "prod"}},
            "aggregations": {"codes": {"terms": {"field": "code"}}}
        }),
    )
    .await;
    let buckets = v["aggregations"]["codes"]["buckets"].as_array().unwrap();
    assert_eq!(
        buckets,
        &vec![
            json!({"key": "200", "doc_count": 2}),
            json!({"key": "500", "doc_count": 1}),
        ]
    );
}

#[tokio::test]
async fn test_nested_avg_per_bucket() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({
            "query": {"term": {"env": "prod"}},
            "aggs": {"services": {
                "terms": {"field": "service"},
                "aggs": {"avg_duration": {"avg": {"field": "duration"}}}
            }}
        }),
    )
    .await;

    let buckets = v["aggregations"]["services"]["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(
        buckets[0],
        json!({
            "key": "api",
            "doc_count": 2,
            "duration": {"value": 15.0, "value_as_string": "n/a"}
        })
    );
    assert_eq!(buckets[1]["key"], json!("web"));
    assert_eq!(buckets[1]["duration"]["value"], json!(5.0));
}

#[tokio::test]
async fn test_metric_aggregations() {
    let (_, engine) = engine();
    index_all(&engine, "spans", span_docs()).await;

    let v = search(
        &engine,
        "spans",
        json!({"aggs": {
            "max_duration": {"max": {"field": "duration"}},
            "avg_duration": {"avg": {"field": "duration"}}
        }}),
    )
    .await;
    assert_eq!(v["aggregations"]["max_duration"], json!({"value": 40}));
    assert_eq!(v["aggregations"]["avg_duration"], json!({"value": 15.2}));
}

#[tokio::test]
async fn test_templated_dates_range_and_read_back() {
    let (_, engine) = engine();
    let template: CreateTemplateRequest = serde_json::from_value(json!({
        "index_patterns": "*jaeger-span-*",
        "mappings": {"properties": {
            "startTimeMillis": {"type": "date", "format": "epoch_millis"},
            "operationName": {"type": "keyword"}
        }}
    }))
    .unwrap();
    engine.put_template("jaeger-span", template).await.unwrap();

    index_all(
        &engine,
        "jaeger-span-2022-06",
        vec![
            json!({"operationName": "a", "startTimeMillis": 1654718054570_i64}),
            json!({"operationName": "b", "startTimeMillis": "1655322854570"}),
            json!({"operationName": "c", "startTimeMillis": 1668173489840_i64}),
        ],
    )
    .await;

    let v = search(
        &engine,
        "jaeger-span-2022-06",
        json!({"query": {"range": {"startTimeMillis": {
            "gte": 1654718054570_i64,
            "lte": "1655322854570",
            "format": "epoch_millis"
        }}}, "sort": ["operationName"]}),
    )
    .await;

    let hits = v["hits"]["hits"].as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["_source"]["operationName"], json!("a"));
    assert_eq!(
        hits[0]["_source"]["startTimeMillis"],
        json!(1654718054000_i64)
    );
    assert_eq!(
        hits[1]["_source"]["startTimeMillis"],
        json!(1655322854000_i64)
    );
}

#[tokio::test]
async fn test_stored_form_is_canonical() {
    let (store, engine) = engine();
    let template: CreateTemplateRequest = serde_json::from_value(json!({
        "index_patterns": ["events-*"],
        "mappings": {"properties": {"ts": {"type": "date", "format": "epoch_second"}}}
    }))
    .unwrap();
    engine.put_template("events", template).await.unwrap();
    engine
        .index_document("events-1", json!({"ts": 1668173489}))
        .await
        .unwrap();

    let rows = store
        .execute("SELECT JSON_EXTRACT(content, '$.ts') AS ts FROM \"events-1\"")
        .await
        .unwrap();
    assert_eq!(rows[0].get("ts").and_then(|v| v.as_str()), Some("2022-11-11T13:31:29Z"));
}

#[tokio::test]
async fn test_bad_date_rejects_document() {
    let (_, engine) = engine();
    let template: CreateTemplateRequest = serde_json::from_value(json!({
        "index_patterns": "events-*",
        "mappings": {"properties": {"ts": {"type": "date", "format": "epoch_millis"}}}
    }))
    .unwrap();
    engine.put_template("events", template).await.unwrap();

    let err = engine
        .index_document("events-1", json!({"ts": "tomorrow"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[tokio::test]
async fn test_missing_index() {
    let (_, engine) = engine();
    let err = engine
        .search("nope", &SearchRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexNotFound(_)));
}

#[tokio::test]
async fn test_compile_error_before_lookup() {
    let (_, engine) = engine();
    let request = SearchRequest::from_value(json!({"aggs": {"x": {}}})).unwrap();
    let err = engine.search("nope", &request).await.unwrap_err();
    assert!(matches!(err, Error::Compile(_)));
}

#[tokio::test]
async fn test_templates_survive_reopen() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    {
        let engine = SearchEngine::new(store.clone());
        let template: CreateTemplateRequest = serde_json::from_value(json!({
            "index_patterns": "logs-*",
            "mappings": {"properties": {"ts": {"type": "date", "format": "epoch_millis"}}}
        }))
        .unwrap();
        engine.put_template("logs", template).await.unwrap();
    }

    let reopened = SearchEngine::open(store).await.unwrap();
    let mapping = reopened.templates().lookup("logs-app").unwrap();
    assert_eq!(mapping.index_patterns, "logs-.*");
    assert!(mapping.date_format("ts").is_some());
}

#[tokio::test]
async fn test_list_indices_counts() {
    let (_, engine) = engine();
    index_all(&engine, "a", vec![json!({"x": 1}), json!({"x": 2})]).await;
    assert!(engine.create_index("b").await.unwrap());
    assert!(!engine.create_index("b").await.unwrap());

    let stats = engine.list_indices().await.unwrap();
    let got: Vec<(&str, u64)> = stats.iter().map(|s| (s.name.as_str(), s.docs_count)).collect();
    assert_eq!(got, vec![("a", 2), ("b", 0)]);
}

#[tokio::test]
async fn test_date_histogram_buckets_by_raw_value() {
    let (_, engine) = engine();
    let template: CreateTemplateRequest = serde_json::from_value(json!({
        "index_patterns": "metrics-*",
        "mappings": {"properties": {"ts": {"type": "date", "format": "epoch_second"}}}
    }))
    .unwrap();
    engine.put_template("metrics", template).await.unwrap();

    index_all(
        &engine,
        "metrics-1",
        vec![
            json!({"ts": 1668173489, "cpu": 10}),
            json!({"ts": 1668173400, "cpu": 30}),
            json!({"ts": 1668173489, "cpu": 20}),
        ],
    )
    .await;

    let v = search(
        &engine,
        "metrics-1",
        json!({"size": 0, "aggs": {"over_time": {
            "date_histogram": {"field": "ts", "fixed_interval": "1h"},
            "aggs": {"peak": {"max": {"field": "cpu"}}}
        }}}),
    )
    .await;

    let buckets = v["aggregations"]["over_time"]["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0]["key"], json!("2022-11-11T13:30:00Z"));
    assert_eq!(buckets[0]["doc_count"], json!(1));
    assert_eq!(buckets[0]["cpu"]["value"], json!(30));
    assert_eq!(buckets[1]["key"], json!("2022-11-11T13:31:29Z"));
    assert_eq!(buckets[1]["doc_count"], json!(2));
    assert_eq!(buckets[1]["cpu"]["value"], json!(20));
}

#[tokio::test]
async fn test_passthrough_date_fields_read_back() {
    let (_, engine) = engine();
    let template: CreateTemplateRequest = serde_json::from_value(json!({
        "index_patterns": "audit-*",
        "mappings": {"properties": {
            "ts": {"type": "date"},
            "at": {"type": "date", "format": "strict_date_optional_time"}
        }}
    }))
    .unwrap();
    engine.put_template("audit", template).await.unwrap();

    let doc = json!({"ts": 2024, "at": 17, "user": "kim"});
    engine.index_document("audit-1", doc.clone()).await.unwrap();
    engine
        .index_document("audit-1", json!({"ts": "2024-01-01", "user": "lee"}))
        .await
        .unwrap();

    let v = search(&engine, "audit-1", json!({"sort": ["user"]})).await;
    assert_eq!(v["hits"]["total"], json!(2));
    assert_eq!(v["hits"]["hits"][0]["_source"], doc);
    assert_eq!(v["hits"]["hits"][1]["_source"]["ts"], json!("2024-01-01"));
}

#[tokio::test]
async fn test_from_and_size_page_through_hits() {
    let (_, engine) = engine();
    let docs = (1..=7).map(|n| json!({"n": n})).collect();
    index_all(&engine, "pages", docs).await;

    let mut seen = Vec::new();
    for from in [0, 3, 6] {
        let v = search(
            &engine,
            "pages",
            json!({"sort": [{"n": "asc"}], "size": 3, "from": from}),
        )
        .await;
        let page: Vec<i64> = v["hits"]["hits"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["_source"]["n"].as_i64().unwrap())
            .collect();
        assert_eq!(v["hits"]["total"], json!(page.len()));
        seen.extend(page);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);

    let v = search(&engine, "pages", json!({"size": 3, "from": 10})).await;
    assert_eq!(v["hits"]["hits"], json!([]));
}
