use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::Result;

/// Builds the rolling file appender for persistent run logs
pub struct FileLogger {
    log_directory: PathBuf,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            rotation: Rotation::DAILY,
        }
    }

    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        // Ensure log directory exists
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender = RollingFileAppender::new(
            self.rotation.to_owned(),
            &self.log_directory,
            "ci_runner_logs", // Prefix for log files
        );

        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Initializes console logging, plus a daily rolling file appender when a
/// log directory is configured. The returned guard must stay alive for the
/// process lifetime or buffered file output is lost.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer();

    match log_dir {
        Some(dir) => {
            let (writer, guard) = FileLogger::new(dir.to_path_buf()).setup_file_logging()?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .init();
            Ok(None)
        }
    }
}
