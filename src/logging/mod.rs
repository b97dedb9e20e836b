//! Structured logging setup
//!
//! The console owns the terminal, so logs go to a rolling file in the
//! user data directory instead of stdout.

use crate::config::{LogFormat, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Examples
///
/// ```
/// use tpops::config::LoggingConfig;
/// use tpops::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("search".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: tpops::config::LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// let filter_str = build_filter_directives(&config);
/// assert_eq!(filter_str, "info,tpops::search=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",tpops::{}={}", component, level));
        }
    }

    filter_str
}

/// Initialize file logging under `log_dir`.
///
/// Returns the worker guard that must be kept alive for the lifetime of
/// the process, or the log output is lost.
pub fn init_file_logging(log_dir: &Path, config: &LoggingConfig) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "tpops.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(build_filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_base_level_only() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn test_filter_directives_with_components() {
        let mut component_levels = HashMap::new();
        component_levels.insert("api".to_string(), "debug".to_string());
        component_levels.insert("poller".to_string(), "trace".to_string());

        let config = LoggingConfig {
            level: "info".to_string(),
            component_levels: Some(component_levels),
            ..Default::default()
        };

        assert_eq!(
            build_filter_directives(&config),
            "info,tpops::api=debug,tpops::poller=trace"
        );
    }
}
