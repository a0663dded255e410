//! Logging setup
//!
//! The engine logs through the `log` facade; binaries call [`init`] once to
//! install `env_logger`. `RUST_LOG` overrides the default `info` filter.

pub use log::{debug, error, info, trace, warn};

/// Filter applied when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_FILTER);
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_err()
    {
        log::trace!("Logger already initialized");
    }
}
