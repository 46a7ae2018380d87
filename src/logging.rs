use env_logger::Env;

/// stderr logger, `info` unless `RUST_LOG` says otherwise. stdout is left
/// for results.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();
}
