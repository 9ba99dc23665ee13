use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_CAREER_URL: &str =
    "https://www.myplan.com/careers/browse-alphabetically.html?letter=all&sort=titles&page=all";
const DEFAULT_BASE_URL: &str = "https://www.myplan.com";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub llm_max_retries: u32,
    /// Deadline for one pipeline stage, spanning all client-level retries.
    pub stage_timeout: Duration,
    pub corpus_dir: PathBuf,
    pub corpus_top_k: usize,
    pub retrieval_timeout: Duration,
    pub output_dir: PathBuf,
    pub num_keywords: u32,
    pub emit_intermediates: bool,
    pub port: u16,
}

/// Settings for the careers-site ingestion run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub career_url: String,
    pub base_url: String,
    pub max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: env_or("LLM_MODEL", crate::llm_client::DEFAULT_MODEL),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            stage_timeout: Duration::from_secs(parse_env("STAGE_TIMEOUT_SECS", 600)?),
            corpus_dir: PathBuf::from(env_or("CORPUS_DIR", "data")),
            corpus_top_k: parse_env("CORPUS_TOP_K", 3)?,
            retrieval_timeout: Duration::from_secs(parse_env("RETRIEVAL_TIMEOUT_SECS", 600)?),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "results")),
            num_keywords: parse_env("NUM_KEYWORDS", crate::pipeline::DEFAULT_NUM_KEYWORDS)?,
            emit_intermediates: parse_env("EMIT_INTERMEDIATES", false)?,
            port: parse_env("PORT", 8080)?,
        })
    }
}

impl ScrapeConfig {
    /// Scraping needs no API key, so it can be loaded on its own.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(ScrapeConfig {
            career_url: env_or("CAREER_URL", DEFAULT_CAREER_URL),
            base_url: env_or("BASE_URL", DEFAULT_BASE_URL),
            max_attempts: parse_env("SCRAPE_MAX_ATTEMPTS", 5)?,
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
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value: '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_padded_numbers() {
        let port: u16 = parse_value("PORT", " 9090 ").unwrap();
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_parse_value_rejects_garbage_with_key_in_message() {
        let err = parse_value::<u32>("NUM_KEYWORDS", "lots").unwrap_err();
        assert!(err.to_string().contains("NUM_KEYWORDS"));
    }

    #[test]
    fn test_parse_value_bool() {
        assert!(parse_value::<bool>("EMIT_INTERMEDIATES", "true").unwrap());
        assert!(parse_value::<bool>("EMIT_INTERMEDIATES", "yes").is_err());
    }
}
