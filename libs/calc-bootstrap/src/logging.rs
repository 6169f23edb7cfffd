use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// Resolve the filter directive from config and the debug toggle.
///
/// Python-style level names (`WARNING`, `CRITICAL`, `FATAL`, `NOTSET`) are
/// mapped to their tracing equivalents. Debug mode lifts plain
/// `error`/`warn`/`info` levels to `debug`; explicit directives such as
/// `calculator=trace` are kept as written.
#[must_use]
pub fn effective_directive(cfg: &LoggingConfig, debug: bool) -> String {
    let level = cfg.level.trim().to_ascii_lowercase();
    let level = match level.as_str() {
        "warning" => "warn".to_owned(),
        "critical" | "fatal" => "error".to_owned(),
        "notset" => "trace".to_owned(),
        _ => level,
    };
    if debug && matches!(level.as_str(), "error" | "warn" | "info") {
        return "debug".to_owned();
    }
    level
}

/// Install the global tracing subscriber and bridge `log` records into it.
///
/// `RUST_LOG`, when set, wins over the configured level.
///
/// # Errors
/// Returns an error if the directive is malformed or a global subscriber or
/// logger is already installed.
pub fn init_logging(cfg: &LoggingConfig, debug: bool) -> Result<()> {
    let directive = effective_directive(cfg, debug);
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directive))?;
    let registry = Registry::default().with(filter);

    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_target(true);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
    }
    tracing_log::LogTracer::init()?;

    tracing::debug!(directive = %directive, format = ?cfg.format, "logging initialized");
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    fn cfg(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_owned(),
            format: LogFormat::Text,
        }
    }

    #[test]
    fn directive_is_normalized() {
        assert_eq!(effective_directive(&cfg(" INFO "), false), "info");
        assert_eq!(effective_directive(&cfg("warn"), false), "warn");
    }

    #[test]
    fn python_level_names_are_mapped() {
        assert_eq!(effective_directive(&cfg("WARNING"), false), "warn");
        assert_eq!(effective_directive(&cfg("CRITICAL"), false), "error");
        assert_eq!(effective_directive(&cfg("fatal"), false), "error");
        assert_eq!(effective_directive(&cfg("NOTSET"), false), "trace");
        assert_eq!(effective_directive(&cfg("Warning"), true), "debug");

        for (level, expected) in [("WARNING", LevelFilter::WARN), ("CRITICAL", LevelFilter::ERROR)] {
            let directive = effective_directive(&cfg(level), false);
            let filter = EnvFilter::try_new(&directive).unwrap();
            assert_eq!(filter.max_level_hint(), Some(expected), "{level} -> {directive}");
        }
    }

    #[test]
    fn debug_mode_lifts_plain_levels() {
        assert_eq!(effective_directive(&cfg("info"), true), "debug");
        assert_eq!(effective_directive(&cfg("ERROR"), true), "debug");
        assert_eq!(effective_directive(&cfg("trace"), true), "trace");
    }

    #[test]
    fn debug_mode_keeps_explicit_directives() {
        assert_eq!(
            effective_directive(&cfg("calculator=trace,tower_http=warn"), true),
            "calculator=trace,tower_http=warn"
        );
    }
}
