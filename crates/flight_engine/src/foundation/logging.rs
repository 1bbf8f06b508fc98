//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system using `RUST_LOG` (defaults to `info`)
pub fn init() {
    init_with_level("info");
}

/// Initialize logging with a default filter such as `"debug"` or
/// `"flight_engine=trace"`. `RUST_LOG` still takes precedence when set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::trace!("Logger already initialized, ignoring filter '{}'", default_filter);
    }
}
