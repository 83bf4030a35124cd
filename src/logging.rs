use crate::config::LogLevel;

/// Initializes `env_logger` at `level`. A `RUST_LOG` in the environment takes
/// precedence. Calling this more than once is harmless.
pub fn init(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.into());
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
}
