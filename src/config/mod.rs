use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub view: ViewConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the account service that owns `/Account/Login`
    pub auth_base_url: String,
    /// Base URL of the planning collection (`/plans`)
    pub plans_base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub default_page_size: u32,
    pub page_size_options: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding `session.json`. `None` resolves to `~/.config/planning`.
    pub config_dir: Option<PathBuf>,
}

pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PLANNING_AUTH_URL") {
            if !v.trim().is_empty() {
                self.api.auth_base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("PLANNING_API_URL") {
            if !v.trim().is_empty() {
                self.api.plans_base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("PLANNING_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("PLANNING_CACHE_MAX_ENTRIES") {
            self.cache.max_entries = v.parse().unwrap_or(self.cache.max_entries);
        }
        if let Ok(v) = env::var("PLANNING_DEFAULT_PAGE_SIZE") {
            let parsed: Option<u32> = v.parse().ok();
            if let Some(size) = parsed.filter(|s| PAGE_SIZE_OPTIONS.contains(s)) {
                self.view.default_page_size = size;
            }
        }
        if let Ok(v) = env::var("PLANNING_CONFIG_DIR") {
            if !v.trim().is_empty() {
                self.session.config_dir = Some(PathBuf::from(v));
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                auth_base_url: "https://api-candidates.hewart.az/account/api/".to_string(),
                plans_base_url: "http://localhost:4000".to_string(),
                request_timeout_secs: 30,
            },
            cache: CacheConfig { max_entries: 256 },
            view: ViewConfig {
                default_page_size: 10,
                page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            },
            session: SessionConfig { config_dir: None },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                request_timeout_secs: 15,
                ..Self::development().api
            },
            ..Self::development()
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                request_timeout_secs: 10,
                ..Self::development().api
            },
            cache: CacheConfig { max_entries: 128 },
            ..Self::development()
        }
    }

    /// Directory for client-persisted state, created on demand by the session store.
    pub fn config_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.session.config_dir {
            return Ok(dir.clone());
        }
        let home = env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        Ok(PathBuf::from(home).join(".config").join("planning"))
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.plans_base_url, "http://localhost:4000");
        assert_eq!(config.view.default_page_size, 10);
        assert_eq!(config.view.page_size_options, vec![10, 20, 50, 100]);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.cache.max_entries, 128);
    }

    #[test]
    fn test_explicit_config_dir_wins() {
        let mut config = AppConfig::development();
        config.session.config_dir = Some(PathBuf::from("/tmp/planning-test"));
        assert_eq!(config.config_dir().unwrap(), PathBuf::from("/tmp/planning-test"));
    }
}
