use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MATCHER_URL: &str = "http://localhost:5000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_MATCHER_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// | Env Var                | Default                 |
/// |------------------------|-------------------------|
/// | `PORT`                 | `8080`                  |
/// | `MATCHER_URL`          | `http://localhost:5000` |
/// | `CORS_ORIGINS`         | `http://localhost:3000` |
/// | `MATCHER_TIMEOUT_SECS` | `15`                    |
/// | `MAX_UPLOAD_BYTES`     | `4194304`               |
/// | `RUST_LOG`             | `info`                  |
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base address of the matcher service; `/matcher` is appended per call.
    pub matcher_url: String,
    pub cors_origins: Vec<HeaderValue>,
    pub matcher_timeout: Duration,
    pub max_upload_bytes: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(v) => v
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let matcher_url = lookup("MATCHER_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MATCHER_URL.to_string());

        let cors_origins = parse_origins(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        )?;

        let timeout_secs = match lookup("MATCHER_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("MATCHER_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_MATCHER_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("MATCHER_TIMEOUT_SECS must be greater than zero");
        }

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            port,
            matcher_url,
            cors_origins,
            matcher_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            HeaderValue::from_str(s).with_context(|| format!("Invalid CORS origin '{s}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if origins.is_empty() {
        anyhow::bail!("CORS_ORIGINS must list at least one origin");
    }
    Ok(origins)
}
