use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        Ok(Self {
            database_url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT", 8080),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

/// Settings for the HTML front end, which only talks to the API over HTTP.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

impl WebConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            api_timeout_secs: env_parse("API_TIMEOUT_SECS", 30),
            host: std::env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("WEB_PORT", 8081),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn socket_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_missing_or_garbage() {
        std::env::remove_var("CATALOG_TEST_MISSING");
        assert_eq!(env_parse("CATALOG_TEST_MISSING", 7u32), 7);

        std::env::set_var("CATALOG_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse("CATALOG_TEST_GARBAGE", 30u64), 30);

        std::env::set_var("CATALOG_TEST_SET", "42");
        assert_eq!(env_parse("CATALOG_TEST_SET", 0u16), 42);
    }

    #[test]
    fn socket_addr_rejects_bad_host() {
        assert!(socket_addr("127.0.0.1", 8080).is_ok());
        assert!(socket_addr("not a host", 8080).is_err());
    }
}
