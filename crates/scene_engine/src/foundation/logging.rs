//! Logging utilities
//!
//! The crate logs through the `log` facade; applications pick the backend.
//! [`init`] and [`init_with_filter`] install `env_logger` for binaries and
//! tests that just want output on stderr.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from the `RUST_LOG` environment variable.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with a default filter such as
/// `"scene_engine=debug"`. `RUST_LOG`, when set, takes precedence.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized; keeping existing configuration");
    }
}
