use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use blog_feed::HttpTimeouts;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub log_level: String,
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
    pub feed_page_size: u32,
    pub comments_page_size: u32,
    pub admin_page_size: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("BLOG_API_URL")
            .map(|value| value.trim().to_string())
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let http_connect_timeout_secs = parse_u64_env("HTTP_CONNECT_TIMEOUT_SECS", 5)?;
        let http_request_timeout_secs = parse_u64_env("HTTP_REQUEST_TIMEOUT_SECS", 15)?;
        let feed_page_size = parse_u32_env("FEED_PAGE_SIZE", 4)?;
        let comments_page_size = parse_u32_env("COMMENTS_PAGE_SIZE", 5)?;
        let admin_page_size = parse_u32_env("ADMIN_PAGE_SIZE", 10)?;

        Ok(Self {
            api_url,
            log_level,
            http_connect_timeout_secs,
            http_request_timeout_secs,
            feed_page_size,
            comments_page_size,
            admin_page_size,
        })
    }

    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_secs(self.http_connect_timeout_secs),
            request: Duration::from_secs(self.http_request_timeout_secs),
        }
    }
}

fn parse_u32_env(key: &str, default: u32) -> Result<u32> {
    parse_positive(key, std::env::var(key).ok(), default)
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64> {
    parse_positive(key, std::env::var(key).ok(), default)
}

fn parse_positive<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr + Default + PartialEq + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
