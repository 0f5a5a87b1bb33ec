use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::candidates::PollPolicy;
use crate::models::query::DEFAULT_PAGE_SIZE;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub page_size: u32,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    pub http_timeout_secs: u64,
    pub rust_log: String,
    /// One-off resume upload performed by the binary after the first fetch.
    pub upload: Option<UploadRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub resume: PathBuf,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let page_size: u32 = parse_or(&get, "ATS_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        anyhow::ensure!(page_size > 0, "ATS_PAGE_SIZE must be at least 1");

        let upload = get("ATS_UPLOAD_RESUME").map(|path| UploadRequest {
            resume: PathBuf::from(path),
            name: get("ATS_UPLOAD_NAME"),
            email: get("ATS_UPLOAD_EMAIL"),
        });

        Ok(Config {
            api_base_url: get("ATS_API_BASE_URL").with_context(|| {
                "Required environment variable 'ATS_API_BASE_URL' is not set".to_string()
            })?,
            api_token: get("ATS_API_TOKEN"),
            page_size,
            poll_attempts: parse_or(&get, "ATS_POLL_ATTEMPTS", 12)?,
            poll_interval_ms: parse_or(&get, "ATS_POLL_INTERVAL_MS", 2000)?,
            http_timeout_secs: parse_or(&get, "ATS_HTTP_TIMEOUT_SECS", 30)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            upload,
        })
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            attempts: self.poll_attempts,
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
