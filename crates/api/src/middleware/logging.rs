//! Subscriber setup.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Noisy dependency targets capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["sqlx::query", "hyper", "tower_http::trace::on_body_chunk"];

fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    QUIET_TARGETS.iter().fold(EnvFilter::new(level), |filter, target| {
        match format!("{target}=warn").parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    })
}

/// Installs the global subscriber. `format = "json"` selects structured output,
/// anything else the human-readable one.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(build_filter(&config.level));

    if config.format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_targets_are_valid_directives() {
        for target in QUIET_TARGETS {
            assert!(format!("{target}=warn").parse::<tracing_subscriber::filter::Directive>().is_ok());
        }
    }

    #[test]
    fn filter_accepts_configured_level() {
        let filter = build_filter("debug");
        assert!(filter.to_string().contains("sqlx::query=warn") || std::env::var("RUST_LOG").is_ok());
    }
}
