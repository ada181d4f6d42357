use std::path::PathBuf;
use std::time::Duration;

use crate::content::remote::DEFAULT_TIMEOUT_MS;
use crate::learner::bkt::{BktConfig, CorrectPosterior};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the problem bank; `None` disables the remote path.
    pub api_base_url: Option<String>,
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env_string("PROBLEM_API_BASE_URL"),
            request_timeout: Duration::from_millis(
                env_u64("PROBLEM_API_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub level: String,
    /// Directory for daily rolling log files; `None` logs to stdout only.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let file_logs = env_string("ENABLE_FILE_LOGS").is_some_and(|v| v == "true" || v == "1");
        Self {
            level: env_string("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            file_dir: file_logs.then(|| {
                PathBuf::from(env_string("LOG_DIR").unwrap_or_else(|| "./logs".to_string()))
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub bkt: BktConfig,
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let correct_posterior = match env_string("BKT_CORRECT_POSTERIOR") {
            Some(raw) => CorrectPosterior::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "unknown BKT_CORRECT_POSTERIOR, using pinned");
                CorrectPosterior::Pinned
            }),
            None => CorrectPosterior::default(),
        };

        Self {
            logging: LoggingConfig::from_env(),
            engine: EngineConfig::from_env(),
            bkt: BktConfig { correct_posterior },
            catalog_path: env_string("SKILL_CATALOG_PATH").map(PathBuf::from),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations cannot race each other.
    #[test]
    fn reads_environment() {
        std::env::set_var("PROBLEM_API_BASE_URL", "  ");
        std::env::set_var("PROBLEM_API_TIMEOUT_MS", "not-a-number");
        std::env::set_var("BKT_CORRECT_POSTERIOR", "bayesian");
        std::env::set_var("ENABLE_FILE_LOGS", "1");
        std::env::set_var("LOG_DIR", "/tmp/mathpath-logs");
        let config = Config::from_env();
        assert!(config.engine.api_base_url.is_none());
        assert_eq!(
            config.engine.request_timeout,
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        );
        assert_eq!(config.bkt.correct_posterior, CorrectPosterior::Bayesian);
        assert_eq!(
            config.logging.file_dir,
            Some(PathBuf::from("/tmp/mathpath-logs"))
        );

        std::env::set_var("PROBLEM_API_BASE_URL", "http://bank.local");
        std::env::set_var("PROBLEM_API_TIMEOUT_MS", "2500");
        std::env::set_var("BKT_CORRECT_POSTERIOR", "sometimes");
        std::env::remove_var("ENABLE_FILE_LOGS");
        let config = Config::from_env();
        assert_eq!(config.engine.api_base_url.as_deref(), Some("http://bank.local"));
        assert_eq!(config.engine.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.bkt.correct_posterior, CorrectPosterior::Pinned);
        assert!(config.logging.file_dir.is_none());

        std::env::remove_var("PROBLEM_API_BASE_URL");
        std::env::remove_var("PROBLEM_API_TIMEOUT_MS");
        std::env::remove_var("BKT_CORRECT_POSTERIOR");
        std::env::remove_var("LOG_DIR");
    }
}
