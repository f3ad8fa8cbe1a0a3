//! Tracing setup for the collector binary
//!
//! Stdout is reserved for line protocol, so the console layer writes to
//! stderr. File logs roll daily under the user's cache directory.

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

const LOG_FILE: &str = "gitlab-metrics.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    /// `None` disables file logging
    pub file_dir: Option<PathBuf>,
    pub file_format: LogFormat,
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_dir: Some(Self::default_log_dir()),
            file_format: LogFormat::Text,
            stderr: true,
        }
    }
}

impl LoggingConfig {
    pub fn default_log_dir() -> PathBuf {
        ProjectDirs::from("", "", "gitlab-metrics")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("gitlab-metrics-logs"))
    }

    /// Reads the `GITLAB_METRICS_*` logging variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(level) = env_var("LOG_LEVEL").and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(dir) = env_var("LOG_DIR") {
            config.file_dir = Some(dir.into());
        }
        if env_var("NO_FILE_LOGS").is_some() {
            config.file_dir = None;
        }
        if env_var("JSON_LOGS").is_some() {
            config.file_format = LogFormat::Json;
        }
        if env_var("NO_CONSOLE_LOGS").is_some() {
            config.stderr = false;
        }

        config
    }

    /// Applies `log_level` from the configuration file; `"Off"` turns file
    /// logging off and leaves the level alone.
    pub fn with_level_override(mut self, log_level: Option<&str>) -> Self {
        match log_level {
            Some(value) if value.eq_ignore_ascii_case("off") => self.file_dir = None,
            Some(value) => {
                if let Ok(level) = value.parse() {
                    self.level = level;
                }
            },
            None => {},
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy()
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("GITLAB_METRICS_{suffix}")).ok()
}

/// Installs the global subscriber. Keep the returned guard alive until
/// exit; dropping it flushes the file writer.
pub fn init_logging(
    config: LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;

    if let Some(dir) = &config.file_dir {
        std::fs::create_dir_all(dir)?;

        let (writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE));
        guard = Some(file_guard);

        let layer = match config.file_format {
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
            LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
        };
        layers.push(layer.with_filter(config.filter()).boxed());
    }

    if config.stderr {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(config.filter())
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(guard)
}
