//! Configuration management for Inkmark

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required on `/api` routes; open when unset
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Client side: where the reader finds the mark API
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                api_token: None,
            },
            database: DatabaseConfig {
                url: "sqlite:./inkmark.db".to_string(),
            },
            reader: ReaderConfig::default(),
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            api_base_url: "http://localhost:3000".to_string(),
            api_token: None,
            request_timeout_secs: 30,
        }
    }
}

/// Empty variables count as unset
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                api_token: optional("API_TOKEN"),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            reader: ReaderConfig {
                api_base_url: env::var("INKMARK_API_URL").unwrap_or(defaults.reader.api_base_url),
                api_token: optional("INKMARK_API_TOKEN"),
                request_timeout_secs: env::var("INKMARK_API_TIMEOUT")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(defaults.reader.request_timeout_secs),
            },
        })
    }
}
