// src/utils/logger.rs
use crate::utils::path::get_log_dir;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use time::macros::format_description;
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    registry,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const DEFAULT_FILE_PREFIX: &str = "dnablock.log";
const DEFAULT_LEVEL: &str = "info";

/// Sets up the process-wide `tracing` subscriber: a daily rolling file
/// plus an optional stderr mirror.
///
/// The binary prints the resolved view model on stdout, so console logs go to
/// stderr to keep that output machine-readable.
#[derive(Debug)]
pub struct LoggerBuilder {
    log_dir: PathBuf,
    file_prefix: String,
    default_level: String,
    console: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        LoggerBuilder {
            log_dir: get_log_dir(),
            file_prefix: DEFAULT_FILE_PREFIX.into(),
            default_level: DEFAULT_LEVEL.into(),
            console: true,
        }
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// `RUST_LOG` wins over the configured default level.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }

    pub fn init(self) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.log_dir)?;
        let file_appender = rolling::daily(&self.log_dir, &self.file_prefix);

        let time_format = LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ));

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true)
            .with_timer(time_format.clone());

        let console_layer = self.console.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_timer(time_format)
                .boxed()
        });

        registry()
            .with(self.filter())
            .with(file_layer)
            .with(console_layer)
            .try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let builder = LoggerBuilder::new()
            .log_dir("elsewhere")
            .file_prefix("resolve")
            .default_level("debug")
            .console(false);
        assert_eq!(builder.log_dir, PathBuf::from("elsewhere"));
        assert_eq!(builder.file_prefix, "resolve");
        assert_eq!(builder.default_level, "debug");
        assert!(!builder.console);
    }

    #[test]
    fn defaults_point_at_data_logs() {
        let builder = LoggerBuilder::default();
        assert!(builder.log_dir.ends_with("logs"));
        assert_eq!(builder.file_prefix, DEFAULT_FILE_PREFIX);
        assert!(builder.console);
    }
}
