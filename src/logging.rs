use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "mathpath.log";

/// Holds the file writer's worker alive; logs still buffered are flushed on drop.
#[must_use]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber: stdout always, a daily rolling file when
/// `config.file_dir` is set. A second call leaves the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) -> LogGuard {
    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_guard = None;
    let file_layer = config.file_dir.as_ref().and_then(|dir| {
        if let Err(err) = std::fs::create_dir_all(dir) {
            eprintln!("failed to create log directory {}: {err}", dir.display());
            return None;
        }
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }

    LogGuard { _file: file_guard }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let config = LoggingConfig {
            level: "debug".into(),
            file_dir: Some(log_dir.clone()),
        };
        let _guard = init_tracing(&config);
        assert!(log_dir.is_dir());
        // Re-initialising must not panic.
        let _again = init_tracing(&LoggingConfig::default());
    }
}
