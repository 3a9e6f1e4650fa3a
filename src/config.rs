use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub pixabay: PixabayConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/pixarr.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Default: true for production safety. Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            cors_allowed_origins: vec![
                "http://localhost:4000".to_string(),
                "http://127.0.0.1:4000".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PixabayConfig {
    /// API key; the PIXABAY_API_KEY environment variable overrides this.
    pub api_key: String,

    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,

    /// Days a cached search keeps being served without a provider call.
    pub cache_ttl_days: i64,
}

impl Default for PixabayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://pixabay.com/api/".to_string(),
            request_timeout_seconds: 30,
            cache_ttl_days: crate::constants::cache::SEARCH_TTL_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            pixabay: PixabayConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pixarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pixarr").join("config.toml"));
        }

        paths
    }

    /// Environment beats the config file for secrets.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("PIXABAY_API_KEY")
            && !key.is_empty()
        {
            self.pixabay.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixabay.api_key.is_empty() {
            anyhow::bail!("Pixabay API key must be set (config [pixabay].api_key or PIXABAY_API_KEY)");
        }

        if self.pixabay.cache_ttl_days <= 0 {
            anyhow::bail!("Search cache TTL must be at least one day");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.pixabay.cache_ttl_days, 3);
        assert_eq!(config.pixabay.base_url, "https://pixabay.com/api/");
        assert_eq!(config.security.argon2_parallelism, 1);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[pixabay]"));
    }

    #[test]
    fn test_validate_rejects_missing_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pixabay.api_key = "test-key".to_string();
        assert!(config.validate().is_ok());
    }
}
