//! Logging setup
//!
//! Filters come from `RUST_LOG` (`EnvFilter` syntax) with a per-entry-point
//! default. Useful settings:
//! - `RUST_LOG=corr_est=debug` - one line per detection or suppressed detection
//! - `RUST_LOG=corr_est::engine=trace` - a span per processed block

use tracing_subscriber::EnvFilter;

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Route unit-test logs through the test harness (default `corr_est=warn`)
///
/// Safe to call from every test; only the first call installs the subscriber.
#[cfg(test)]
pub fn init_test_tracing() {
    use once_cell::sync::Lazy;

    static TRACING: Lazy<()> = Lazy::new(|| {
        tracing_subscriber::fmt()
            .with_env_filter(filter_or("corr_est=warn"))
            .with_test_writer()
            .init();
    });
    Lazy::force(&TRACING);
}

/// Log to stderr for the binaries (default `corr_est=info`), keeping stdout for results
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(filter_or("corr_est=info"))
        .with_writer(std::io::stderr)
        .init();
}
