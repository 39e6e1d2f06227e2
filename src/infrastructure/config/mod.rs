use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::podcast::{ProcessorSettings, RetryPolicy};
use crate::infrastructure::repositories::elevenlabs_voice_repository::ELEVENLABS_DEFAULT_BASE_URL;
use crate::infrastructure::repositories::gemini_content_repository::GEMINI_DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Content service
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    // Voice service
    pub elevenlabs_api_key: String,
    pub elevenlabs_model: String,
    pub elevenlabs_base_url: String,
    pub service_timeout: Duration,
    // Uploads and artifacts
    pub max_upload_bytes: usize,
    pub output_dir: PathBuf,
    // Job processing
    pub job_queue_capacity: usize,
    pub job_concurrency: usize,
    pub synthesis_concurrency: usize,
    pub retry_max_attempts: u32,
    pub retry_initial_backoff: Duration,
    pub retry_max_backoff: Duration,
    pub job_retention: Duration,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Reads variables through `lookup` so tests need not touch the process env
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        match (self.lookup)(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::Missing(name)),
        }
    }

    fn or(&self, name: &str, default: &str) -> String {
        (self.lookup)(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.lookup)(name) {
            None => Ok(default),
            Some(value) => match value.trim().parse::<T>() {
                Ok(parsed) => Ok(parsed),
                Err(e) => Err(ConfigError::Invalid {
                    name,
                    reason: e.to_string(),
                    value,
                }),
            },
        }
    }

    fn positive<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default + Copy,
        T::Err: std::fmt::Display,
    {
        let value = self.parse(name, default)?;
        if value <= T::default() {
            return Err(ConfigError::Invalid {
                name,
                value: self.or(name, ""),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let config = Config {
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parse("PORT", 8080)?,
            environment: match vars.or("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match vars.or("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            gemini_api_key: vars.required("GEMINI_API_KEY")?,
            gemini_model: vars.or("GEMINI_MODEL", "gemini-1.5-flash"),
            gemini_base_url: vars.or("GEMINI_BASE_URL", GEMINI_DEFAULT_BASE_URL),
            elevenlabs_api_key: vars.required("ELEVENLABS_API_KEY")?,
            elevenlabs_model: vars.or("ELEVENLABS_MODEL", "eleven_flash_v2_5"),
            elevenlabs_base_url: vars.or("ELEVENLABS_BASE_URL", ELEVENLABS_DEFAULT_BASE_URL),
            service_timeout: Duration::from_secs(vars.positive("SERVICE_TIMEOUT_SECS", 60u64)?),
            max_upload_bytes: vars.positive("MAX_UPLOAD_BYTES", 16 * 1024 * 1024usize)?,
            output_dir: (vars.lookup)("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("studysauce").join("output")),
            job_queue_capacity: vars.positive("JOB_QUEUE_CAPACITY", 64usize)?,
            job_concurrency: vars.positive("JOB_CONCURRENCY", 4usize)?,
            synthesis_concurrency: vars.positive("SYNTHESIS_CONCURRENCY", 2usize)?,
            retry_max_attempts: vars.positive("RETRY_MAX_ATTEMPTS", 3u32)?,
            retry_initial_backoff: Duration::from_millis(
                vars.parse("RETRY_INITIAL_BACKOFF_MS", 2000u64)?,
            ),
            retry_max_backoff: Duration::from_millis(vars.parse("RETRY_MAX_BACKOFF_MS", 10_000u64)?),
            job_retention: Duration::from_secs(vars.positive("JOB_RETENTION_SECS", 3600u64)?),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_development() {
            "studysauce_backend=debug,tower_http=debug"
        } else {
            "studysauce_backend=info,tower_http=info"
        }
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            retry: RetryPolicy::new(
                self.retry_max_attempts,
                self.retry_initial_backoff,
                self.retry_max_backoff,
            ),
            synthesis_concurrency: self.synthesis_concurrency,
        }
    }
}
