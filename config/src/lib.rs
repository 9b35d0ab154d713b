//! Process configuration loaded from the environment (spec §6 "Environment").
//!
//! `.env` is loaded first via `dotenvy` for local development; in production
//! the orchestrator (systemd unit, container, etc.) sets these directly and
//! `.env` simply won't exist. Missing required variables are a startup
//! error, not a runtime one: callers should let [`Config::load`] fail and
//! exit non-zero rather than defaulting silently.

use std::env::VarError;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} is not valid unicode")]
    NotUnicode { name: &'static str },
    #[error("environment variable {name} could not be parsed: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub script_provider_base_url: String,
    pub script_provider_api_key: String,
    pub voice_provider_base_url: String,
    pub voice_provider_api_key: String,
    pub video_provider_base_url: String,
    pub video_provider_api_key: String,
    pub http_listen_addr: String,
    pub worker_concurrency: usize,
    pub worker_rate_limit_per_minute: u32,
    pub sweeper_grace_period: Duration,
}

impl Config {
    /// Loads and validates configuration. Exits the process (via the caller
    /// propagating the error out of `main`) rather than guessing at a
    /// default for anything security- or correctness-sensitive.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            s3_bucket: required("S3_BUCKET")?,
            s3_endpoint: optional("S3_ENDPOINT"),
            script_provider_base_url: required("SCRIPT_PROVIDER_BASE_URL")?,
            script_provider_api_key: required("SCRIPT_PROVIDER_API_KEY")?,
            voice_provider_base_url: required("VOICE_PROVIDER_BASE_URL")?,
            voice_provider_api_key: required("VOICE_PROVIDER_API_KEY")?,
            video_provider_base_url: required("VIDEO_PROVIDER_BASE_URL")?,
            video_provider_api_key: required("VIDEO_PROVIDER_API_KEY")?,
            http_listen_addr: optional("HTTP_LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            worker_concurrency: parse_optional("WORKER_CONCURRENCY")?.unwrap_or(2),
            worker_rate_limit_per_minute: parse_optional("WORKER_RATE_LIMIT_PER_MINUTE")?
                .unwrap_or(10),
            sweeper_grace_period: Duration::from_secs(
                parse_optional::<u64>("SWEEPER_GRACE_PERIOD_SECS")?.unwrap_or(300),
            ),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(ConfigError::Missing(name)),
        Err(VarError::NotPresent) => Err(ConfigError::Missing(name)),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { name }),
    }
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_optional<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                source: Box::new(e),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "DATABASE_URL",
            "REDIS_URL",
            "S3_BUCKET",
            "S3_ENDPOINT",
            "SCRIPT_PROVIDER_BASE_URL",
            "SCRIPT_PROVIDER_API_KEY",
            "VOICE_PROVIDER_BASE_URL",
            "VOICE_PROVIDER_API_KEY",
            "VIDEO_PROVIDER_BASE_URL",
            "VIDEO_PROVIDER_API_KEY",
            "HTTP_LISTEN_ADDR",
            "WORKER_CONCURRENCY",
            "WORKER_RATE_LIMIT_PER_MINUTE",
            "SWEEPER_GRACE_PERIOD_SECS",
        ] {
            // SAFETY: tests run serially (see #[serial]), so no other thread
            // observes the environment mid-mutation.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn missing_required_var_fails_closed() {
        clear_env();
        let err = Config::load().expect_err("expected missing DATABASE_URL");
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    #[serial]
    fn defaults_are_applied_when_optional_vars_absent() {
        clear_env();
        // SAFETY: serialized by #[serial].
        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/test");
            std::env::set_var("REDIS_URL", "redis://localhost");
            std::env::set_var("S3_BUCKET", "bucket");
            std::env::set_var("SCRIPT_PROVIDER_BASE_URL", "https://script.example");
            std::env::set_var("SCRIPT_PROVIDER_API_KEY", "key");
            std::env::set_var("VOICE_PROVIDER_BASE_URL", "https://voice.example");
            std::env::set_var("VOICE_PROVIDER_API_KEY", "key");
            std::env::set_var("VIDEO_PROVIDER_BASE_URL", "https://video.example");
            std::env::set_var("VIDEO_PROVIDER_API_KEY", "key");
        }
        let config = Config::load().expect("config should load");
        assert_eq!(config.worker_concurrency, 2);
        assert_eq!(config.worker_rate_limit_per_minute, 10);
        assert_eq!(config.http_listen_addr, "0.0.0.0:8080");
    }
}
