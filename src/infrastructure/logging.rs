//! Logging setup
//!
//! Console output goes to stderr through `tracing-subscriber`; when a logs
//! folder is configured every run also writes `<folder>/<bot name> <time>.log`.

use crate::application::errors::ConfigError;
use crate::infrastructure::config::Config;
use crate::utils::console::stderr_supports_color;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set
pub fn default_directive(config: &Config) -> &'static str {
    if config.bot.debug {
        "debug"
    } else {
        "info"
    }
}

/// File name for this run's log file
pub fn log_file_name(config: &Config, now: chrono::DateTime<chrono::Local>) -> Result<String, ConfigError> {
    let format = &config.logging.log_filename_time_format;
    let mut name = format!("{} ", config.bot.name);
    write!(name, "{}", now.format(format)).map_err(|_| {
        ConfigError::InvalidValue(format!("logging.log-filename-time-format '{}' is not a valid time format", format))
    })?;
    name.push_str(".log");
    Ok(name)
}

/// Path of this run's log file, if file logging is enabled
pub fn log_file_path(config: &Config, now: chrono::DateTime<chrono::Local>) -> Result<Option<PathBuf>, ConfigError> {
    match &config.logging.logs_folder {
        Some(folder) => Ok(Some(folder.join(log_file_name(config, now)?))),
        None => Ok(None),
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit,
/// dropping it flushes the file writer.
pub fn init_logging(config: &Config) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(stderr_supports_color())
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file_path(config, chrono::Local::now())? {
        Some(path) => {
            let (folder, name) = split_path(&path)?;
            std::fs::create_dir_all(&folder).map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "could not create logs folder {}: {}",
                    folder.display(),
                    e
                ))
            })?;

            let appender = tracing_appender::rolling::never(folder, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::InvalidValue(format!("logging already initialized: {}", e)))?;

    Ok(guard)
}

fn split_path(path: &Path) -> Result<(PathBuf, String), ConfigError> {
    let folder = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConfigError::InvalidValue(format!("bad log file path {}", path.display())))?
        .to_string();
    Ok((folder, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name_uses_bot_name_and_time_format() {
        let mut config = Config::default();
        config.bot.name = "template bot".to_string();
        let now = chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(log_file_name(&config, now).unwrap(), "template bot 2024-03-09 14-05-07.log");
        assert_eq!(
            log_file_path(&config, now).unwrap(),
            Some(PathBuf::from("./logs").join("template bot 2024-03-09 14-05-07.log"))
        );
    }

    #[test]
    fn test_no_logs_folder_disables_file_logging() {
        let mut config = Config::default();
        config.logging.logs_folder = None;
        assert!(log_file_path(&config, chrono::Local::now()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_time_specifier_is_an_error() {
        let mut config = Config::default();
        config.logging.log_filename_time_format = "%Y-%Q".to_string();

        let result = log_file_path(&config, chrono::Local::now());
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_debug_raises_default_level() {
        let mut config = Config::default();
        assert_eq!(default_directive(&config), "info");
        config.bot.debug = true;
        assert_eq!(default_directive(&config), "debug");
    }
}
