//! Tracing subscriber setup driven by [`LoggingConfig`].

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE: &str = "purpleair2mqtt.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level {level:?}: {source}")]
    Level { level: String, source: ParseError },

    #[error("unknown log level {0:?}")]
    UnknownLevel(String),

    #[error("failed to open log file: {0}")]
    File(#[from] InitError),

    #[error("failed to install subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered file output on drop and must live
/// until the process exits.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(&config.level)?;

    let (writer, guard) = match &config.path {
        Some(path) => {
            let (writer, guard) = file_writer(path, config.rotate, config.max_keep)?;
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };
    let ansi = config.path.is_none();

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()?;
    }

    Ok(guard)
}

/// `RUST_LOG` wins; otherwise the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = normalize_level(level)?;
    EnvFilter::try_new(&directives).map_err(|source| LoggingError::Level {
        level: level.to_string(),
        source,
    })
}

/// Map a bare level name, including the Python names older config files
/// carry (`WARNING`, `CRITICAL`), to a filter directive. Anything with `=`
/// or `,` is passed through as a directive list.
pub fn normalize_level(level: &str) -> Result<String, LoggingError> {
    let trimmed = level.trim();
    if trimmed.contains('=') || trimmed.contains(',') {
        return Ok(trimmed.to_string());
    }

    let directive = match trimmed.to_ascii_lowercase().as_str() {
        "trace" | "notset" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => return Err(LoggingError::UnknownLevel(level.to_string())),
    };
    Ok(directive.to_string())
}

/// Non-blocking writer to `path`, rotated daily when `rotate` is set.
pub fn file_writer(
    path: &Path,
    rotate: bool,
    max_keep: usize,
) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);

    let rotation = if rotate {
        Rotation::DAILY
    } else {
        Rotation::NEVER
    };
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_name);
    if rotate {
        builder = builder.max_log_files(max_keep.max(1));
    }
    let appender = builder.build(dir)?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_level_names_are_mapped() {
        assert_eq!(normalize_level("WARNING").unwrap(), "warn");
        assert_eq!(normalize_level("CRITICAL").unwrap(), "error");
        assert_eq!(normalize_level("Info").unwrap(), "info");
        assert_eq!(normalize_level(" debug ").unwrap(), "debug");
        assert_eq!(normalize_level("NOTSET").unwrap(), "trace");
    }

    #[test]
    fn directive_lists_pass_through() {
        assert_eq!(
            normalize_level("pa_bridge=debug,info").unwrap(),
            "pa_bridge=debug,info"
        );
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = normalize_level("verbose").unwrap_err();
        assert!(matches!(err, LoggingError::UnknownLevel(ref l) if l == "verbose"));
        assert!(matches!(normalize_level(""), Err(LoggingError::UnknownLevel(_))));
    }

    #[test]
    fn file_writer_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.log");
        let (_writer, guard) = file_writer(&path, false, 10).unwrap();
        drop(guard);
        assert!(path.exists());
    }

    #[test]
    fn rotating_writer_uses_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.log");
        let (_writer, guard) = file_writer(&path, true, 3).unwrap();
        drop(guard);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("bridge.log")), "{names:?}");
    }
}
