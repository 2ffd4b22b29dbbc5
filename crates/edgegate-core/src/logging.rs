//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,edgegate=debug";

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, falling back to `info,edgegate=debug`. Does nothing if
/// a subscriber is already installed.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Install the global tracing subscriber with a fallback filter directive
pub fn init_tracing_with(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
