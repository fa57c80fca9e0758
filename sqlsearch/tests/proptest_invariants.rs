//! Property-based tests for date conversion and permissive decoding.

use proptest::prelude::*;
use serde_json::json;
use sqlsearch::date::{from_canonical, to_canonical};
use sqlsearch::dsl::{Query, SearchRequest};

// Roughly year 1 to year 9999, the range RFC 3339 text can hold
const MIN_SECS: i64 = -62_135_596_800;
const MAX_SECS: i64 = 253_402_300_799;

proptest! {
    #[test]
    fn epoch_second_roundtrip(secs in MIN_SECS..=MAX_SECS) {
        let canonical = to_canonical("epoch_second", &json!(secs)).unwrap();
        let back = from_canonical("epoch_second", canonical.as_str().unwrap()).unwrap();
        prop_assert_eq!(back, json!(secs));
    }

    #[test]
    fn epoch_millis_roundtrip_truncates_to_second(millis in (MIN_SECS * 1000)..=(MAX_SECS * 1000)) {
        let canonical = to_canonical("epoch_millis", &json!(millis)).unwrap();
        let back = from_canonical("epoch_millis", canonical.as_str().unwrap()).unwrap();
        prop_assert_eq!(back, json!(millis.div_euclid(1000) * 1000));
    }

    #[test]
    fn epoch_second_matches_scaled_millis(secs in MIN_SECS..=MAX_SECS) {
        let a = to_canonical("epoch_second", &json!(secs)).unwrap();
        let b = to_canonical("epoch_millis", &json!(secs * 1000)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn numeral_string_matches_number(millis in 0i64..=4_102_444_800_000) {
        let a = to_canonical("epoch_millis", &json!(millis)).unwrap();
        let b = to_canonical("epoch_millis", &json!(millis.to_string())).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn term_shorthand_matches_verbose(field in "[a-z][a-z0-9_]{0,12}", value in "[ -~]{0,24}") {
        let short: Query = serde_json::from_value(json!({"term": {&field: &value}})).unwrap();
        let verbose: Query =
            serde_json::from_value(json!({"term": {&field: {"value": &value}}})).unwrap();
        prop_assert_eq!(short, verbose);
    }

    #[test]
    fn match_shorthand_matches_verbose(field in "[a-z][a-z0-9_]{0,12}", value in "[ -~]{0,24}") {
        let short: Query = serde_json::from_value(json!({"match": {&field: &value}})).unwrap();
        let verbose: Query =
            serde_json::from_value(json!({"match": {&field: {"query": &value}}})).unwrap();
        prop_assert_eq!(short, verbose);
    }

    #[test]
    fn must_single_matches_one_element_array(field in "[a-z]{1,8}", value in "[a-z0-9]{1,8}") {
        let inner = json!({"term": {&field: &value}});
        let single: Query = serde_json::from_value(json!({"bool": {"must": inner.clone()}})).unwrap();
        let list: Query = serde_json::from_value(json!({"bool": {"must": [inner]}})).unwrap();
        prop_assert_eq!(single, list);
    }

    #[test]
    fn aggregations_key_always_wins(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let req = SearchRequest::from_value(json!({
            "aggs": {&a: {"terms": {"field": "x"}}},
            "aggregations": {&b: {"avg": {"field": "y"}}}
        }))
        .unwrap();
        prop_assert_eq!(req.aggs.len(), 1);
        prop_assert!(req.aggs.contains_key(&b));
    }
}
