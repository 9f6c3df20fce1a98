//! Tracing subscriber initialization.
//!
//! Logs go to stderr so that binaries can keep stdout for their own output.
//! Filtering follows `RUST_LOG` (default `info`); `COURIER_LOG_FORMAT`
//! selects `json` (default) or `text`.

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "COURIER_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl LogFormat {
    /// Read [`LOG_FORMAT_VAR`]; unknown or missing values mean JSON.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_VAR)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_format() {
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse(" Pretty "), LogFormat::Text);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn init_is_idempotent() {
        init(LogFormat::Text);
        init(LogFormat::Json);
        ::tracing::info!("still logging after a second init");
    }
}
