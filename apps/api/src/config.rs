use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const MEBIBYTE: u64 = 1024 * 1024;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * MEBIBYTE;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc", ".txt", ".rtf"];
pub const DEFAULT_RETENTION_HOURS: u64 = 24;
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 300;

/// Application configuration loaded from environment variables.
/// Startup fails if the Document Intelligence endpoint or key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub doc_intel_endpoint: String,
    pub doc_intel_api_key: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub retention: Duration,
    pub analysis_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let allowed_extensions = match std::env::var("ALLOWED_EXTENSIONS") {
            Ok(raw) if !raw.trim().is_empty() => parse_extensions(&raw),
            _ => default_extensions(),
        };

        Ok(Config {
            doc_intel_endpoint: require_env("AZURE_DOC_INTEL_ENDPOINT")?,
            doc_intel_api_key: require_env("AZURE_DOC_INTEL_API_KEY")?,
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "Uploads".to_string()),
            ),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            allowed_extensions,
            retention: retention_from_hours(env_or(
                "RETENTION_HOURS",
                DEFAULT_RETENTION_HOURS,
            )?)?,
            analysis_timeout: Duration::from_secs(env_or(
                "ANALYSIS_TIMEOUT_SECS",
                DEFAULT_ANALYSIS_TIMEOUT_SECS,
            )?),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

pub fn default_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

/// Parses a comma-separated extension list into lowercase, dot-prefixed entries.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim().trim_start_matches('.').to_lowercase();
        if trimmed.is_empty() {
            continue;
        }
        let ext = format!(".{trimmed}");
        if !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }
    extensions
}

/// Converts `RETENTION_HOURS` into a window, refusing values that overflow.
pub fn retention_from_hours(hours: u64) -> Result<Duration> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .with_context(|| format!("RETENTION_HOURS is too large: {hours}"))
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
