//! Logging setup.
//!
//! The library only emits through the `log` facade. Binaries and tests that
//! want to see the output call [`init`] (level from `RUST_LOG`, default `info`).

/// Install an `env_logger` backend. Safe to call more than once.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
