use env_logger::Env;

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn";

pub fn init_logger() {
    init_logger_with(DEFAULT_FILTER);
}

/// Initializes the global logger, falling back to `default_filter` when the
/// environment does not configure one. Calling it twice is harmless.
pub fn init_logger_with(default_filter: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}

pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
