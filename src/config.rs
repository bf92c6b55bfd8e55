//! Configuration module

use std::env;

use crate::model::ArtifactPaths;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name
    pub app_name: String,

    /// Reported API version
    pub app_version: String,

    /// Environment (development, production)
    pub environment: String,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Classifier artifact (.json or .onnx)
    pub model_path: String,

    /// Scaler artifact (.json)
    pub scaler_path: String,

    /// Allowed CORS origins, `*` allows any
    pub cors_origins: Vec<String>,

    /// Default log filter level when RUST_LOG is unset
    pub log_level: String,

    /// Emit JSON log lines instead of pretty text
    pub log_json: bool,

    /// JSON log file written alongside stdout; `None` disables it
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Heart Disease Predictor API".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: "models/heart_disease_forest.json".to_string(),
            scaler_path: "models/scaler.json".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
            log_level: "info".to_string(),
            log_json: false,
            log_file: Some("logs/app.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable keys keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            app_version: lookup("APP_VERSION").unwrap_or(defaults.app_version),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: lookup("MODEL_PATH").unwrap_or(defaults.model_path),
            scaler_path: lookup("SCALER_PATH").unwrap_or(defaults.scaler_path),

            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),

            log_level: lookup("LOG_LEVEL")
                .map(|l| l.to_lowercase())
                .unwrap_or(defaults.log_level),

            log_json: lookup("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),

            // An empty LOG_FILE turns the file sink off
            log_file: match lookup("LOG_FILE") {
                Some(path) if path.trim().is_empty() => None,
                Some(path) => Some(path),
                None => defaults.log_file,
            },
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_path, &self.scaler_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, "models/heart_disease_forest.json");
        assert_eq!(config.cors_origins.len(), 2);
        assert!(!config.log_json);
        assert_eq!(config.log_file.as_deref(), Some("logs/app.log"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("MODEL_PATH", "/srv/model.onnx"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "JSON"),
            ("ENVIRONMENT", "production"),
        ]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.artifact_paths().model.to_str(), Some("/srv/model.onnx"));
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(config.log_json);
        assert!(config.is_production());
    }

    #[test]
    fn test_log_file() {
        let config = Config::from_lookup(lookup(&[("LOG_FILE", "/var/log/cardiorisk.log")]));
        assert_eq!(config.log_file.as_deref(), Some("/var/log/cardiorisk.log"));

        let config = Config::from_lookup(lookup(&[("LOG_FILE", "")]));
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = Config::from_lookup(lookup(&[("PORT", "eighty")]));
        assert_eq!(config.port, 8000);
    }
}
