pub mod api;
pub mod core;

/// Installs `env_logger` once; later calls are no-ops. Level comes from
/// `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
