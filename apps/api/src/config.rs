use anyhow::{Context, Result};

const DEFAULT_SUMMARY_CACHE_TTL_SECS: u64 = 86_400;

/// Application configuration loaded from environment variables.
/// Nothing is required: without a model key the service runs on canned summaries.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when unset or blank.
    pub anthropic_api_key: Option<String>,
    /// Redis-backed summary cache when set, in-process map otherwise.
    pub redis_url: Option<String>,
    pub summary_cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            redis_url: optional_env("REDIS_URL"),
            summary_cache_ttl_secs: match optional_env("SUMMARY_CACHE_TTL_SECS") {
                Some(raw) => raw
                    .parse::<u64>()
                    .context("SUMMARY_CACHE_TTL_SECS must be a whole number of seconds")?,
                None => DEFAULT_SUMMARY_CACHE_TTL_SECS,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    non_blank(std::env::var(key).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_count_as_unset() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(
            non_blank(Some(" sk-ant-123 ".to_string())),
            Some("sk-ant-123".to_string())
        );
    }
}
