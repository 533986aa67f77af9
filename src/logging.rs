//! Log setup.
//!
//! The terminal belongs to the UI, so everything goes to a file:
//! `<directory>/<file>`, truncated at startup. `RUST_LOG` overrides the
//! configured level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Keep alive until exit; dropping it flushes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> io::Result<LoggingGuard> {
    let path = prepare_log_file(&config.directory, &config.file)?;

    let file_appender = tracing_appender::rolling::never(&config.directory, &config.file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}

/// Create the directory and truncate the previous session's log
fn prepare_log_file(directory: &Path, file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let path = directory.join(file);
    fs::write(&path, "")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_creates_and_truncates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested/logs");

        let path = prepare_log_file(&dir, "geodash.log").unwrap();
        assert!(path.exists());

        fs::write(&path, "old session").unwrap();
        prepare_log_file(&dir, "geodash.log").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
