// ⚙️ Configuration - TOML file + environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::{FileMappingFetcher, HttpMappingFetcher, MappingFetcher};
use crate::labels::{Catalog, NoTranslations, Translator};

pub const CONFIG_ENV: &str = "EVENT_CLASSIFIER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "event-classifier.toml";

const BACKEND_URL_ENV: &str = "EVENT_CLASSIFIER_BACKEND_URL";
const MAPPINGS_ENV: &str = "EVENT_CLASSIFIER_MAPPINGS";
const TRANSLATIONS_ENV: &str = "EVENT_CLASSIFIER_TRANSLATIONS";
const SERVER_ADDR_ENV: &str = "EVENT_CLASSIFIER_SERVER_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Backend base URL (the type mappings route is appended)
    pub backend_url: String,

    /// Local mapping table used instead of the backend
    pub mappings_path: Option<PathBuf>,

    /// Nested locale JSON for labels
    pub translations_path: Option<PathBuf>,

    /// tracing filter directive, used when RUST_LOG is unset
    pub log_filter: String,

    pub request_timeout_secs: u64,

    /// Listen address of the API server
    pub server_addr: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            backend_url: "http://127.0.0.1:4242".to_string(),
            mappings_path: None,
            translations_path: None,
            log_filter: "info".to_string(),
            request_timeout_secs: 30,
            server_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Parse a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Config file named by `EVENT_CLASSIFIER_CONFIG` (or `event-classifier.toml`
    /// if present), then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => ClassifierConfig::from_file(PathBuf::from(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => ClassifierConfig::from_file(DEFAULT_CONFIG_FILE)?,
            None => ClassifierConfig::default(),
        };

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV) {
            self.backend_url = url;
        }
        if let Some(path) = lookup(MAPPINGS_ENV) {
            self.mappings_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(TRANSLATIONS_ENV) {
            self.translations_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup(SERVER_ADDR_ENV) {
            self.server_addr = addr;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Local file when configured, otherwise the backend
    pub fn fetcher(&self) -> Arc<dyn MappingFetcher> {
        match &self.mappings_path {
            Some(path) => Arc::new(FileMappingFetcher::new(path.clone())),
            None => Arc::new(HttpMappingFetcher::new(&self.backend_url, self.request_timeout())),
        }
    }

    pub fn translator(&self) -> Result<Arc<dyn Translator>> {
        match &self.translations_path {
            Some(path) => Ok(Arc::new(Catalog::from_file(path)?)),
            None => Ok(Arc::new(NoTranslations)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();

        assert_eq!(config.backend_url, "http://127.0.0.1:4242");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.mappings_path.is_none());
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend_url = \"http://localhost:5042\"").unwrap();
        writeln!(file, "request_timeout_secs = 5").unwrap();

        let config = ClassifierConfig::from_file(file.path()).unwrap();

        assert_eq!(config.backend_url, "http://localhost:5042");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.server_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = \"soon\"").unwrap();

        let err = ClassifierConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = HashMap::new();
        vars.insert(BACKEND_URL_ENV, "http://backend:4242");
        vars.insert(MAPPINGS_ENV, "/tmp/mappings.json");

        let mut config = ClassifierConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.backend_url, "http://backend:4242");
        assert_eq!(config.mappings_path, Some(PathBuf::from("/tmp/mappings.json")));
        assert!(config.translations_path.is_none());
    }

    #[test]
    fn test_translator_from_missing_file_fails() {
        let config = ClassifierConfig {
            translations_path: Some(PathBuf::from("/nonexistent/en.json")),
            ..ClassifierConfig::default()
        };

        assert!(config.translator().is_err());
    }
}
