//! Effective configuration with provenance
//!
//! The merged configuration plus where each layer came from, with secrets
//! redacted so it can be printed as-is.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Schema identifier
pub const SCHEMA_ID: &str = "account-portal/effective_config@1";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object, secrets redacted
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Typed view of the settings the client reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub busy_label: String,
    pub storage_path: Option<PathBuf>,
    pub log_filter: String,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "cookie",
    "api_key",
    "credential",
];

/// Default user config location: `~/.config/portal/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config/portal/config.toml"))
}

/// Default client state location: `~/.config/portal/state.json`
pub fn default_state_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config/portal/state.json"))
}

impl EffectiveConfig {
    /// Build the effective config from the user file and CLI overrides.
    ///
    /// A missing user file is skipped; an unreadable or malformed one is an
    /// error.
    pub fn build(
        user_config: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = user_config {
            if path.exists() {
                let (value, digest) = load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::User,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let mut merged = merge_layers(layers);
        let redactions = redact_secrets(&mut merged);
        validate_config(&merged)?;

        Ok(Self {
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
            redactions,
        })
    }

    /// Extract the typed settings
    pub fn settings(&self) -> Result<PortalSettings, ConfigError> {
        let defaults = BuiltinDefaults::default();

        let base_url = self.get_str("base_url").unwrap_or(&defaults.base_url);
        let base_url = parse_base_url(base_url)?;
        let connect_timeout = Duration::from_secs(
            self.get_u64("connect_timeout_seconds")
                .unwrap_or(defaults.connect_timeout_seconds),
        );

        Ok(PortalSettings {
            base_url,
            connect_timeout,
            busy_label: self
                .get_str("ui.busy_label")
                .map(str::to_string)
                .unwrap_or(defaults.busy_label),
            storage_path: self.get_str("storage.path").map(PathBuf::from),
            log_filter: self
                .get_str("log.filter")
                .map(str::to_string)
                .unwrap_or(defaults.log_filter),
        })
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;
    let toml_value: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    Ok((toml_to_json(toml_value), digest))
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn redact_secrets(value: &mut Value) -> Vec<String> {
    let mut redactions = Vec::new();
    redact_recursive(value, String::new(), &mut redactions);
    redactions
}

fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let key_lower = key.to_lowercase();
                let current_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };

                let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));
                if is_secret && !val.is_object() && !val.is_array() {
                    *val = Value::String("[REDACTED]".to_string());
                    redactions.push(current_path);
                } else {
                    redact_recursive(val, current_path, redactions);
                }
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter_mut().enumerate() {
                redact_recursive(val, format!("{}[{}]", path, i), redactions);
            }
        }
        _ => {}
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::ValidationError(format!("base_url '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

fn validate_config(config: &Value) -> Result<(), ConfigError> {
    match config.get("base_url") {
        Some(Value::String(url)) => {
            parse_base_url(url)?;
        }
        Some(_) => {
            return Err(ConfigError::ValidationError(
                "base_url must be a string".to_string(),
            ))
        }
        None => {}
    }

    if let Some(connect) = config.get("connect_timeout_seconds") {
        match connect.as_u64() {
            Some(secs) if secs > 0 && secs <= 300 => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "connect_timeout_seconds must be in (0, 300]".to_string(),
                ))
            }
        }
    }

    if let Some(label) = config.get("ui").and_then(|ui| ui.get("busy_label")) {
        if label.as_str().map(|s| s.trim().is_empty()).unwrap_or(true) {
            return Err(ConfigError::ValidationError(
                "ui.busy_label must be a non-empty string".to_string(),
            ));
        }
    }

    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.base_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(settings.connect_timeout, Duration::from_secs(30));
        assert_eq!(settings.busy_label, "Processing...");
        assert_eq!(settings.storage_path, None);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_cli_beats_user_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "base_url = \"https://portal.example\"").unwrap();
        writeln!(temp, "connect_timeout_seconds = 10").unwrap();
        writeln!(temp, "[ui]").unwrap();
        writeln!(temp, "busy_label = \"Working\"").unwrap();

        let cli = json!({"connect_timeout_seconds": 3});
        let config = EffectiveConfig::build(Some(temp.path()), Some(cli)).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.base_url.host_str(), Some("portal.example"));
        assert_eq!(settings.connect_timeout, Duration::from_secs(3));
        assert_eq!(settings.busy_label, "Working");

        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[1].origin, ConfigOrigin::User);
        assert_eq!(config.sources[1].digest.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_missing_user_file_skipped() {
        let config =
            EffectiveConfig::build(Some(Path::new("/nonexistent/portal.toml")), None).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_malformed_user_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "base_url = ").unwrap();

        let err = EffectiveConfig::build(Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_base_url_scheme_validated() {
        let err = EffectiveConfig::build(None, Some(json!({"base_url": "ftp://host"}))).unwrap_err();
        assert!(err.to_string().contains("http or https"));

        let err = EffectiveConfig::build(None, Some(json!({"base_url": "not a url"}))).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_connect_timeout_validated() {
        for bad in [json!(0), json!(301), json!("ten")] {
            let result = EffectiveConfig::build(None, Some(json!({"connect_timeout_seconds": bad})));
            assert!(result.unwrap_err().to_string().contains("connect_timeout_seconds"));
        }
    }

    #[test]
    fn test_secret_redaction() {
        let cli = json!({
            "auth": {"session_cookie": "access_token=abc", "username": "root"},
            "api_token": "t0ken"
        });

        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.get_str("auth.session_cookie"), Some("[REDACTED]"));
        assert_eq!(config.get_str("auth.username"), Some("root"));
        assert_eq!(config.get_str("api_token"), Some("[REDACTED]"));
        assert!(config.redactions.contains(&"auth.session_cookie".to_string()));
        assert!(!config.to_json().unwrap().contains("access_token=abc"));
    }

    #[test]
    fn test_storage_path_setting() {
        let cli = json!({"storage": {"path": "/tmp/portal-state.json"}});
        let settings = EffectiveConfig::build(None, Some(cli))
            .unwrap()
            .settings()
            .unwrap();
        assert_eq!(
            settings.storage_path,
            Some(PathBuf::from("/tmp/portal-state.json"))
        );
    }
}
