//! Log output for the server.
//!
//! Pretty logs while developing, JSON lines in production. `RUST_LOG`
//! overrides the default filter, e.g. `RUST_LOG=debug,dd_api::assistant=trace`.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

/// Install the global subscriber for `env`
pub fn init_tracing(env: &Environment) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(env)));

    if env.is_development() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .pretty()
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(filter),
            )
            .init();
    }

    tracing::info!(environment = ?env, "Tracing initialized");
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(env: &Environment) -> &'static str {
    if env.is_development() {
        "debug,tower_http=debug,hyper_util=info,reqwest=info"
    } else {
        "info,tower_http=info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for env in [Environment::Development, Environment::Production] {
            assert!(EnvFilter::try_new(default_filter(&env)).is_ok());
        }
        assert!(default_filter(&Environment::Development).starts_with("debug"));
        assert!(default_filter(&Environment::Production).starts_with("info"));
    }
}
