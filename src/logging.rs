use env_logger::Env;

/// `RUST_LOG` wins over `level`; `info` when neither is set.
pub fn init(level: Option<&str>) {
    let default = level.unwrap_or("info");
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default))
        .format_target(false)
        .try_init();
}

/// Captured logger for tests; safe to call from every test.
pub fn init_for_tests() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
