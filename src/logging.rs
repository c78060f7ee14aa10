//! Tracing subscriber setup shared by both binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the global subscriber. `RUST_LOG` takes precedence over `log_level`.
pub fn init_tracing(log_level: &str, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so rendered output on stdout stays clean
    if json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
