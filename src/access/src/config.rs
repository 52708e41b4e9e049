//! Session configuration loading and validation

use serde::Deserialize;
use std::path::Path;

use crate::engine::CacheConfig;
use crate::error::{AccessError, Result};
use crate::sync::DEFAULT_DIAGNOSTICS_CAPACITY;

/// Complete access configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub backend: BackendConfig,
    pub cache: CacheConfig,
    pub metrics: MetricsConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Identity/catalog backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub identity_path: String,
    pub catalog_path: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            identity_path: "/auth/profile".to_string(),
            catalog_path: "/modules".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Sync records kept in the ledger
    pub capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

impl AccessConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| AccessError::Config(e.to_string()))
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `ACCESS_BACKEND_URL`, `ACCESS_TIMEOUT_MS` and
    /// `ACCESS_CACHE_CAPACITY` on top of this configuration
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("ACCESS_BACKEND_URL") {
            self.backend.base_url = url;
        }

        if let Some(timeout) = lookup("ACCESS_TIMEOUT_MS") {
            self.backend.timeout_ms = timeout
                .parse()
                .map_err(|_| AccessError::Config(format!("ACCESS_TIMEOUT_MS: '{}' is not a number", timeout)))?;
        }

        if let Some(capacity) = lookup("ACCESS_CACHE_CAPACITY") {
            self.cache.capacity = capacity.parse().map_err(|_| {
                AccessError::Config(format!("ACCESS_CACHE_CAPACITY: '{}' is not a number", capacity))
            })?;
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(AccessError::Config("backend.base_url must not be empty".into()));
        }

        if !self.backend.base_url.starts_with("http://") && !self.backend.base_url.starts_with("https://") {
            return Err(AccessError::Config(format!(
                "backend.base_url must be http(s): '{}'",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_ms == 0 {
            return Err(AccessError::Config("backend.timeout_ms must be positive".into()));
        }

        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(AccessError::Config("cache.capacity must be positive when caching is enabled".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = AccessConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.cache.enabled);
        assert_eq!(config.diagnostics.capacity, DEFAULT_DIAGNOSTICS_CAPACITY);
    }

    #[test]
    fn test_partial_toml() {
        let config = AccessConfig::from_toml(
            r#"
            [backend]
            base_url = "https://admin.example.com/api"

            [cache]
            capacity = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "https://admin.example.com/api");
        assert_eq!(config.backend.identity_path, "/auth/profile");
        assert_eq!(config.cache.capacity, 64);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_bad_toml() {
        let err = AccessConfig::from_toml("[backend\nbase_url = 1").unwrap_err();
        assert!(matches!(err, AccessError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("ACCESS_BACKEND_URL", "https://other.example.com"),
            ("ACCESS_TIMEOUT_MS", "2500"),
        ]
        .into_iter()
        .collect();

        let config = AccessConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.backend.base_url, "https://other.example.com");
        assert_eq!(config.backend.timeout_ms, 2500);
    }

    #[test]
    fn test_non_numeric_override() {
        let result = AccessConfig::default()
            .with_overrides(|key| (key == "ACCESS_TIMEOUT_MS").then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = AccessConfig::default();
        config.backend.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AccessConfig::default();
        config.backend.base_url = "ftp://nope".into();
        assert!(config.validate().is_err());

        let mut config = AccessConfig::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
        config.cache.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.toml");
        std::fs::write(&path, "[metrics]\nenabled = false\n").unwrap();

        let config = AccessConfig::load(&path).unwrap();
        assert!(!config.metrics.enabled);

        assert!(matches!(
            AccessConfig::load(dir.path().join("missing.toml")),
            Err(AccessError::Io(_))
        ));
    }
}
