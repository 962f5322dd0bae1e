//! Flattening of structured resource values into dotted attribute keys
//!
//! Lists become `key.#` plus `key.N.*`, maps and objects become `key.%`
//! plus `key.name`, and nulls are omitted. Assertions are written against
//! these keys (`capacity_units.0.query_capacity_units`, `tags.Key1`).

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flatten the top-level `values` object of a resource.
pub fn flatten(values: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (key, value) in values {
        flatten_into(key, value, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            out.insert(format!("{}.#", prefix), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten_into(&format!("{}.{}", prefix, i), item, out);
            }
        }
        Value::Object(map) => {
            out.insert(format!("{}.%", prefix), map.len().to_string());
            for (key, item) in map {
                flatten_into(&format!("{}.{}", prefix, key), item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn flat(value: Value) -> BTreeMap<String, String> {
        flatten(value.as_object().unwrap())
    }

    #[test]
    fn scalars() {
        let out = flat(json!({
            "name": "idx",
            "count": 13,
            "enabled": false,
            "missing": null,
        }));
        assert_eq!(out["name"], "idx");
        assert_eq!(out["count"], "13");
        assert_eq!(out["enabled"], "false");
        assert!(!out.contains_key("missing"));
    }

    #[test]
    fn nested_blocks() {
        let out = flat(json!({
            "capacity_units": [
                { "query_capacity_units": 0, "storage_capacity_units": 0 }
            ],
            "index_statistics": [
                {
                    "faq_statistics": [{ "indexed_question_answers_count": 0 }],
                    "text_document_statistics": [
                        { "indexed_text_bytes": 0, "indexed_text_documents_count": 0 }
                    ]
                }
            ],
            "user_group_resolution_configuration": [],
        }));
        assert_eq!(out["capacity_units.#"], "1");
        assert_eq!(out["capacity_units.0.query_capacity_units"], "0");
        assert_eq!(out["index_statistics.0.faq_statistics.#"], "1");
        assert_eq!(
            out["index_statistics.0.text_document_statistics.0.indexed_text_bytes"],
            "0"
        );
        assert_eq!(out["user_group_resolution_configuration.#"], "0");
    }

    #[test]
    fn maps() {
        let out = flat(json!({ "tags": { "Key1": "Value1" } }));
        assert_eq!(out["tags.%"], "1");
        assert_eq!(out["tags.Key1"], "Value1");
    }

    proptest! {
        /// A flat map of strings flattens to itself
        #[test]
        fn flat_string_maps_are_identity(
            entries in prop::collection::btree_map("[a-z_]{1,12}", ".*", 0..20)
        ) {
            let map: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            prop_assert_eq!(flatten(&map), entries);
        }

        /// List counts always match the number of elements
        #[test]
        fn list_count_matches_len(items in prop::collection::vec(any::<i64>(), 0..30)) {
            let mut map = Map::new();
            map.insert("xs".to_string(), json!(items));
            let out = flatten(&map);
            prop_assert_eq!(out["xs.#"].clone(), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                prop_assert_eq!(out[&format!("xs.{}", i)].clone(), item.to_string());
            }
        }
    }
}
