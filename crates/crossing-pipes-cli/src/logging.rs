use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter when RUST_LOG is unset
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Initialize logging to stderr so stdout only carries the reports.
///
/// If RUST_LOG is not set, a default is set first. Must run before any other thread starts.
pub fn setup_logging() {
    let defaulted = std::env::var("RUST_LOG").is_err();
    if defaulted {
        // Safety: single-threaded at startup
        unsafe {
            std::env::set_var("RUST_LOG", default_filter());
        }
    }

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();

    if defaulted {
        tracing::debug!("RUST_LOG set to default: {}", default_filter());
    }
}
