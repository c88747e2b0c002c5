//! Layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: replace (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
///
/// A `null` in the overlay replaces whatever the base held.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in precedence order (first is base, last wins)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_keys_survive_partial_overlay() {
        let base = json!({"ui": {"busy_label": "Processing...", "color": "auto"}});
        let overlay = json!({"ui": {"busy_label": "Wait"}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["ui"]["busy_label"], "Wait");
        assert_eq!(result["ui"]["color"], "auto");
    }

    #[test]
    fn test_arrays_are_replaced() {
        let result = deep_merge(json!({"hosts": ["a", "b"]}), json!({"hosts": ["c"]}));
        assert_eq!(result["hosts"], json!(["c"]));
    }

    #[test]
    fn test_null_clears_value() {
        let result = deep_merge(json!({"storage": {"path": "/tmp/x"}}), json!({"storage": {"path": null}}));
        assert!(result["storage"]["path"].is_null());
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({"base_url": "http://127.0.0.1:8000", "connect_timeout_seconds": 30});
        let user = json!({"base_url": "https://portal.example"});
        let cli = json!({"connect_timeout_seconds": 5});

        let result = merge_layers(vec![builtin, user, cli]);

        assert_eq!(result["base_url"], "https://portal.example");
        assert_eq!(result["connect_timeout_seconds"], 5);
    }
}
