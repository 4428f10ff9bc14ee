use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::gemini::DEFAULT_MODEL;
use crate::llm_client::rate_limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
use crate::resume::chunking::{ChunkingConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::screening::fit_scoring::DEFAULT_FIT_THRESHOLD;

/// Which `FitScorer` backend to install at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitScorerKind {
    Llm,
    Keyword,
}

impl FromStr for FitScorerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(FitScorerKind::Llm),
            "keyword" => Ok(FitScorerKind::Keyword),
            other => bail!("FIT_SCORER must be 'llm' or 'keyword', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub resume_chunking: ChunkingConfig,
    pub fit_score_threshold: f64,
    pub fit_scorer: FitScorerKind,
    pub admin_username: String,
    pub admin_password: String,
    /// Sender address for candidate notifications. Unset disables sending.
    pub mail_sender: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", DEFAULT_MAX_REQUESTS)?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW.as_secs())?,
            resume_chunking: ChunkingConfig {
                chunk_size: parse_env("RESUME_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
                chunk_overlap: parse_env("RESUME_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            },
            fit_score_threshold: parse_env("FIT_SCORE_THRESHOLD", DEFAULT_FIT_THRESHOLD)?,
            fit_scorer: parse_env("FIT_SCORER", FitScorerKind::Llm)?,
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password: require_env("ADMIN_PASSWORD")?,
            mail_sender: std::env::var("MAIL_SENDER")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_scorer_kind_parses_case_insensitively() {
        assert_eq!("LLM".parse::<FitScorerKind>().unwrap(), FitScorerKind::Llm);
        assert_eq!(" keyword ".parse::<FitScorerKind>().unwrap(), FitScorerKind::Keyword);
        assert!("semantic".parse::<FitScorerKind>().is_err());
    }

    #[test]
    fn test_parse_value_names_the_variable() {
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert_eq!(parse_value::<f64>("FIT_SCORE_THRESHOLD", " 65.5 ").unwrap(), 65.5);
    }
}
