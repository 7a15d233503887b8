//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "SECURECACHE_LOG";

/// Install the global subscriber.
///
/// Filter directives come from `SECURECACHE_LOG`, falling back to
/// `default_directives` (for example `"securecache=info"`). Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing(default_directives: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives));

    let installed =
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
