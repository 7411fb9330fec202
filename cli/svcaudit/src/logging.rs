//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries only the report.

use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_err() {
        debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(false, false);
        init(true, true);
    }
}
