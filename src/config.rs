use std::path::PathBuf;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Lungscan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Label the remote classifier returns for a healthy chest.
pub const DEFAULT_HEALTHY_LABEL: &str = "Normal";

const DEFAULT_PREDICT_URL: &str = "http://localhost:5000/predict";
const DEFAULT_MODEL_INFO_URL: &str = "http://localhost:5000/model_info";
const DEFAULT_REPORT_URL: &str = "http://localhost:5001/generate_report";
const DEFAULT_RECOMMENDATION_URL: &str = "http://localhost:5002/recommendation";
const DEFAULT_CHAT_URL: &str = "http://localhost:5005/llmanswers";
const DEFAULT_VISION_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_VISION_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "lungscan=info"
}

/// Get the application data directory (~/Lungscan/).
/// Falls back to the working directory when no home directory exists.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Where generated patient reports are written by default.
pub fn reports_dir() -> PathBuf {
    app_data_dir().join("reports")
}

/// Addresses and transport settings for every remote collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub predict_url: String,
    pub model_info_url: String,
    pub report_url: String,
    pub recommendation_url: String,
    pub chat_url: String,
    /// Base URL of the generative vision API (without the model path).
    pub vision_endpoint: String,
    pub vision_model: String,
    /// Never serialized; keys stay out of diagnostics.
    #[serde(skip)]
    pub vision_api_key: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            predict_url: DEFAULT_PREDICT_URL.into(),
            model_info_url: DEFAULT_MODEL_INFO_URL.into(),
            report_url: DEFAULT_REPORT_URL.into(),
            recommendation_url: DEFAULT_RECOMMENDATION_URL.into(),
            chat_url: DEFAULT_CHAT_URL.into(),
            vision_endpoint: DEFAULT_VISION_ENDPOINT.into(),
            vision_model: DEFAULT_VISION_MODEL.into(),
            vision_api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `LUNGSCAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            predict_url: get("LUNGSCAN_PREDICT_URL").unwrap_or(defaults.predict_url),
            model_info_url: get("LUNGSCAN_MODEL_INFO_URL").unwrap_or(defaults.model_info_url),
            report_url: get("LUNGSCAN_REPORT_URL").unwrap_or(defaults.report_url),
            recommendation_url: get("LUNGSCAN_RECOMMENDATION_URL")
                .unwrap_or(defaults.recommendation_url),
            chat_url: get("LUNGSCAN_CHAT_URL").unwrap_or(defaults.chat_url),
            vision_endpoint: get("LUNGSCAN_VISION_ENDPOINT").unwrap_or(defaults.vision_endpoint),
            vision_model: get("LUNGSCAN_VISION_MODEL").unwrap_or(defaults.vision_model),
            vision_api_key: get("GEMINI_API_KEY"),
            timeout_secs: parse_secs(
                "LUNGSCAN_HTTP_TIMEOUT_SECS",
                get("LUNGSCAN_HTTP_TIMEOUT_SECS"),
                defaults.timeout_secs,
            ),
            connect_timeout_secs: parse_secs(
                "LUNGSCAN_CONNECT_TIMEOUT_SECS",
                get("LUNGSCAN_CONNECT_TIMEOUT_SECS"),
                defaults.connect_timeout_secs,
            ),
        }
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: u64) -> u64 {
    match raw {
        None => default,
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!(key, value = %value, default, "Ignoring invalid timeout override");
                default
            }
        },
    }
}

/// Workflow routing settings.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowConfig {
    /// Prediction label that routes straight to the conversational assistant.
    pub healthy_label: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            healthy_label: DEFAULT_HEALTHY_LABEL.into(),
        }
    }
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        let healthy_label = std::env::var("LUNGSCAN_HEALTHY_LABEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HEALTHY_LABEL.into());
        Self { healthy_label }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Lungscan"));
    }

    #[test]
    fn reports_dir_under_app_data() {
        let reports = reports_dir();
        assert!(reports.starts_with(app_data_dir()));
        assert!(reports.ends_with("reports"));
    }

    #[test]
    fn defaults_match_local_deployment() {
        let config = ServiceConfig::default();
        assert_eq!(config.predict_url, "http://localhost:5000/predict");
        assert_eq!(config.report_url, "http://localhost:5001/generate_report");
        assert_eq!(config.recommendation_url, "http://localhost:5002/recommendation");
        assert_eq!(config.chat_url, "http://localhost:5005/llmanswers");
        assert_eq!(config.vision_model, "gemini-2.0-flash");
        assert!(config.vision_api_key.is_none());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("LUNGSCAN_PREDICT_URL", "http://classifier:9000/predict"),
            ("GEMINI_API_KEY", "secret"),
            ("LUNGSCAN_HTTP_TIMEOUT_SECS", "30"),
        ]));
        assert_eq!(config.predict_url, "http://classifier:9000/predict");
        assert_eq!(config.vision_api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.report_url, "http://localhost:5001/generate_report");
    }

    #[test]
    fn invalid_timeout_falls_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("LUNGSCAN_HTTP_TIMEOUT_SECS", "soon"),
            ("LUNGSCAN_CONNECT_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.vision_api_key.is_none());
    }

    #[test]
    fn api_key_never_serialized() {
        let config = ServiceConfig {
            vision_api_key: Some("secret".into()),
            ..ServiceConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn healthy_label_default_is_normal() {
        assert_eq!(WorkflowConfig::default().healthy_label, "Normal");
    }
}
