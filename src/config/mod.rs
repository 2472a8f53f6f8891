use anyhow::{anyhow, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub upload_max_bytes: usize,
    pub cors_origin: HeaderValue,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        let public_base_url = env_or("PUBLIC_BASE_URL", "http://localhost:8080")
            .trim_end_matches('/')
            .to_string();

        let cors_origin = env_or("CORS_ORIGIN", "http://localhost:5173");
        let cors_origin = HeaderValue::from_str(&cors_origin)
            .map_err(|err| anyhow!("invalid CORS_ORIGIN: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "10")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            public_base_url,
            upload_max_bytes: env_or_parse("UPLOAD_MAX_BYTES", "10485760")?,
            cors_origin,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
