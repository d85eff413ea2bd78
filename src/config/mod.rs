use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Reference data such as branch lists
    pub reference_stale_secs: u64,
    /// Enumeration lists (statuses, categories, types)
    pub enum_stale_secs: u64,
    /// Silent retries of transient read failures; never more than one
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub debounce_ms: u64,
}

impl CacheConfig {
    pub fn reference_stale_time(&self) -> Duration {
        Duration::from_secs(self.reference_stale_secs)
    }

    pub fn enum_stale_time(&self) -> Duration {
        Duration::from_secs(self.enum_stale_secs)
    }
}

impl UiConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("REGISTRY_API_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("REGISTRY_API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("REGISTRY_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Cache overrides
        if let Ok(v) = env::var("REGISTRY_REFERENCE_STALE_SECS") {
            self.cache.reference_stale_secs = v.parse().unwrap_or(self.cache.reference_stale_secs);
        }
        if let Ok(v) = env::var("REGISTRY_ENUM_STALE_SECS") {
            self.cache.enum_stale_secs = v.parse().unwrap_or(self.cache.enum_stale_secs);
        }
        if let Ok(v) = env::var("REGISTRY_MAX_RETRIES") {
            self.cache.max_retries = v.parse().unwrap_or(self.cache.max_retries);
        }
        self.cache.max_retries = self.cache.max_retries.min(1);

        // UI overrides
        if let Ok(v) = env::var("REGISTRY_DEBOUNCE_MS") {
            self.ui.debounce_ms = v.parse().unwrap_or(self.ui.debounce_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8000/api".to_string(),
                timeout_secs: 30,
                enable_request_logging: true,
            },
            cache: CacheConfig {
                reference_stale_secs: 5 * 60,
                enum_stale_secs: 10 * 60,
                max_retries: 1,
            },
            ui: UiConfig { debounce_ms: 300 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.registry.example.com/api".to_string(),
                timeout_secs: 20,
                enable_request_logging: true,
            },
            cache: CacheConfig {
                reference_stale_secs: 5 * 60,
                enum_stale_secs: 10 * 60,
                max_retries: 1,
            },
            ui: UiConfig { debounce_ms: 300 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://registry.example.com/api".to_string(),
                timeout_secs: 15,
                enable_request_logging: false,
            },
            cache: CacheConfig {
                reference_stale_secs: 5 * 60,
                enum_stale_secs: 10 * 60,
                max_retries: 1,
            },
            ui: UiConfig { debounce_ms: 300 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.ui.debounce_ms, 300);
        assert_eq!(config.cache.enum_stale_time(), Duration::from_secs(600));
        assert_eq!(config.cache.max_retries, 1);
        assert!(config.api.enable_request_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.base_url.starts_with("https://"));
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.cache.reference_stale_time(), Duration::from_secs(300));
    }
}
