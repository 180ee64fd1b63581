//! Log output for the agent and its tooling.

use crate::config::AgentConfiguration;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for the given debug setting.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise `info` or `debug`.
pub fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(debug)))
}

/// Install the global fmt subscriber. Later calls are no-ops.
pub fn init_logging(debug_logging: bool) {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter(debug_logging))
        .with_target(debug_logging)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!(debug_logging, "Logging initialized");
    }
}

/// Install logging as requested by `configuration.enable_debug_logging`.
pub fn init_for(configuration: &AgentConfiguration) {
    init_logging(configuration.enable_debug_logging);
}

/// Log an outgoing span when debug logging is enabled.
pub fn log_span(configuration: &AgentConfiguration, span: &crate::span::SpanData) {
    if !configuration.enable_debug_logging {
        return;
    }
    let attributes: Vec<String> = span
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    tracing::debug!(
        span = %span.name,
        attributes = %attributes.join(", "),
        "Span"
    );
}
