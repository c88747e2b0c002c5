//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Server root (default: the backend's development address)
    pub base_url: String,

    /// Connection timeout in seconds (default: 30)
    pub connect_timeout_seconds: u64,

    /// Label shown on a locked submit control
    pub busy_label: String,

    /// Transient storage file; unset means `<config dir>/state.json`
    pub storage_path: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout_seconds: 30,
            busy_label: "Processing...".to_string(),
            storage_path: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        let mut storage = serde_json::Map::new();
        if let Some(path) = &self.storage_path {
            storage.insert("path".to_string(), path.clone().into());
        }
        serde_json::json!({
            "base_url": self.base_url,
            "connect_timeout_seconds": self.connect_timeout_seconds,
            "ui": {
                "busy_label": self.busy_label
            },
            "storage": storage,
            "log": {
                "filter": self.log_filter
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.base_url, "http://127.0.0.1:8000");
        assert_eq!(defaults.connect_timeout_seconds, 30);
        assert_eq!(defaults.busy_label, "Processing...");
        assert!(defaults.storage_path.is_none());
    }

    #[test]
    fn test_to_value_nests_sections() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["ui"]["busy_label"], "Processing...");
        assert_eq!(value["log"]["filter"], "warn");
        assert!(value["storage"].as_object().unwrap().is_empty());
    }
}
