use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::CaisseConfig;

/// Log files are named `caisse.YYYY-MM-DD` and rotate daily.
const LOG_FILE_PREFIX: &str = "caisse";

/// Where the log goes and how verbose it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub dir: PathBuf,
    /// `EnvFilter` directives, overridden by `RUST_LOG` when set.
    pub filter: String,
    /// Mirror records to stderr. Stdout stays free for command output.
    pub console: bool,
}

impl LogSettings {
    /// `~/.caisse/logs` at the configured level, with console output.
    pub fn from_config(config: &CaisseConfig) -> Result<Self> {
        Ok(Self {
            dir: CaisseConfig::logs_dir()?,
            filter: default_filter(&config.log_level),
            console: true,
        })
    }
}

/// `level` globally, the engine and the binary at debug.
pub fn default_filter(level: &str) -> String {
    let level = match level.trim() {
        "" => "info",
        other => other,
    };
    format!("{level},caisse_docs=debug,caisse_app=debug")
}

/// Install the global subscriber: a daily file under `settings.dir` and,
/// optionally, a compact stderr layer. The returned guard flushes the file
/// writer when dropped and must outlive the program's logging.
pub fn init_logging(settings: &LogSettings) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.dir)
        .with_context(|| format!("Failed to create log directory: {}", settings.dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&settings.dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let console = settings.console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(console)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: PathBuf) -> LogSettings {
        LogSettings {
            dir,
            filter: default_filter("warn"),
            console: false,
        }
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("info"), "info,caisse_docs=debug,caisse_app=debug");
        assert_eq!(default_filter(" warn "), "warn,caisse_docs=debug,caisse_app=debug");
        assert_eq!(default_filter("  "), "info,caisse_docs=debug,caisse_app=debug");
    }

    #[test]
    fn test_settings_follow_config_level() {
        let config = CaisseConfig {
            log_level: "debug".into(),
            ..Default::default()
        };
        let settings = LogSettings::from_config(&config).unwrap();
        assert!(settings.filter.starts_with("debug,"));
        assert!(settings.dir.ends_with("logs"));
        assert!(settings.console);
    }

    #[test]
    fn test_init_creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        // The global subscriber may already be set by another test; the
        // directory is created before that matters.
        let _ = init_logging(&settings(dir.clone()));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_second_init_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let _first = init_logging(&settings(tmp.path().join("a")));
        let err = init_logging(&settings(tmp.path().join("b"))).unwrap_err();
        assert!(err.to_string().contains("Failed to initialize logging"));
    }
}
