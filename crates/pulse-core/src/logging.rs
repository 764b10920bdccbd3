//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Filter comes from `PULSE_LOG` (falling back to `RUST_LOG`, then the
/// given default). Safe to call once per process; later calls are no-ops.
pub fn init(default_filter: &str) {
    let filter = std::env::var("PULSE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter.to_string());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .try_init();
}
