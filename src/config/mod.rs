//! Configuration module for the Ivoke site.
//!
//! All configuration is loaded from environment variables. The backend endpoint
//! and its public key have no defaults; everything else does.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

/// Configuration could not be assembled from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Connection settings for the hosted data/auth backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted project, without trailing slash
    pub url: String,
    /// Public (anonymous) API key
    pub anon_key: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let url = required("IVOKE_BACKEND_URL")?;
        let anon_key = required("IVOKE_BACKEND_ANON_KEY")?;

        let raw_addr = env::var("IVOKE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError::Invalid {
            name: "IVOKE_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let log_level = env::var("IVOKE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            backend: BackendConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            },
            bind_addr,
            log_level,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations never race each other.
    #[test]
    fn test_config_from_env() {
        env::remove_var("IVOKE_BACKEND_URL");
        env::remove_var("IVOKE_BACKEND_ANON_KEY");
        env::remove_var("IVOKE_BIND_ADDR");
        env::remove_var("IVOKE_LOG_LEVEL");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("IVOKE_BACKEND_URL"))
        ));

        env::set_var("IVOKE_BACKEND_URL", "https://project.example.co/");
        env::set_var("IVOKE_BACKEND_ANON_KEY", "public-key");

        let config = Config::from_env().unwrap();
        assert_eq!(config.backend.url, "https://project.example.co");
        assert_eq!(config.backend.anon_key, "public-key");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");

        env::set_var("IVOKE_BIND_ADDR", "not-an-address");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "IVOKE_BIND_ADDR", .. })
        ));

        env::remove_var("IVOKE_BACKEND_URL");
        env::remove_var("IVOKE_BACKEND_ANON_KEY");
        env::remove_var("IVOKE_BIND_ADDR");
    }
}
