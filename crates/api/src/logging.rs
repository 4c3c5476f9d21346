//! Tracing subscriber bootstrap.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Level used when `LOG_LEVEL` cannot be parsed.
const FALLBACK_LEVEL: LevelFilter = LevelFilter::DEBUG;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set and valid; otherwise `LOG_LEVEL` applies to every
/// target. An unparsable level falls back to `debug` and logs a warning once
/// the subscriber is up.
pub fn init(config: &LogConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|directives| !directives.trim().is_empty());
    let (filter, rejected) = build_filter(rust_log.as_deref(), &config.level);

    let registry = tracing_subscriber::registry().with(filter);
    if config.pretty {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    }

    if rejected {
        tracing::warn!(level = %config.level, "Failed to parse log level, default is debug");
    }
}

/// Build the filter from `RUST_LOG` (if any) and `LOG_LEVEL`.
///
/// The flag is set when `level` was not a level name and the fallback was used.
fn build_filter(rust_log: Option<&str>, level: &str) -> (EnvFilter, bool) {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return (filter, false);
    }

    let (level, rejected) = match parse_level(level) {
        Some(level) => (level, false),
        None => (FALLBACK_LEVEL, true),
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("");
    (filter, rejected)
}

/// Parse a level name. Accepts the `tracing` names plus `warning`, and maps
/// `fatal` and `panic` to `error`.
fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::WARN),
        "fatal" | "panic" => Some(LevelFilter::ERROR),
        other => other.parse().ok(),
    }
}
