use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::errors::AppError;

const LOG_FILE_NAME: &str = "eatlog.log";

/// Set up logging based on configuration.
///
/// `RUST_LOG` overrides the configured level. Without a file path, logs go
/// to stderr so command output on stdout stays clean.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let Some(path) = config.log_file_path() else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();
        set_global(subscriber)?;
        return Ok(None);
    };

    let (file_writer, guard) = create_file_logger(Path::new(path))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(file_writer)
        .with_ansi(false)
        .finish();
    set_global(subscriber)?;

    Ok(Some(guard))
}

fn set_global<S>(subscriber: S) -> Result<(), AppError>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| AppError::Generic {
        message: format!("Failed to set global tracing subscriber: {}", e),
    })
}

/// Default log directory, used when the configured path has no parent
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eatlog")
        .join("logs")
}

/// A configured path naming a directory gets daily rotated files
fn is_log_directory(log_path: &Path) -> bool {
    log_path.as_os_str().to_string_lossy().ends_with(std::path::MAIN_SEPARATOR)
        || log_path.is_dir()
}

fn create_log_dir(log_dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(log_dir).map_err(|e| AppError::Generic {
        message: format!("Failed to create log directory {:?}: {}", log_dir, e),
    })
}

fn create_file_logger(log_path: &Path) -> Result<(NonBlocking, WorkerGuard), AppError> {
    let file_appender = if is_log_directory(log_path) {
        create_log_dir(log_path)?;
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_NAME)
            .build(log_path)
            .map_err(|e| AppError::Generic {
                message: format!("Failed to create rolling log file in {:?}: {}", log_path, e),
            })?
    } else {
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(default_log_dir);
        create_log_dir(&log_dir)?;

        let file_name = log_path
            .file_name()
            .unwrap_or(std::ffi::OsStr::new(LOG_FILE_NAME));
        tracing_appender::rolling::never(&log_dir, file_name)
    };

    Ok(tracing_appender::non_blocking(file_appender))
}
