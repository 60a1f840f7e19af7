//! Structured logging init (spec §9 ambient stack: every component
//! logs through `tracing`, never `println!`). Mirrors the teacher's
//! `init_logging`/`init_json_logging` split between a human-readable
//! dev format and a JSON format for aggregation, minus the
//! audit-replica span filter this system has no equivalent engine for.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Human-readable logging for local development and interactive use.
pub fn init_logging() {
    let subscriber = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(false));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already set");
    }
}

/// JSON logging for production deployments behind a log aggregator.
pub fn init_json_logging() {
    let subscriber = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_current_span(true));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already set");
    }
}
