//! thin wrapper around `env_logger` so `driver` has one call to make.

/// initializes the global logger from `RUST_LOG`, defaulting to `warn`.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}
