//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace, LevelFilter};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    if let Err(err) = env_logger::try_init() {
        log::debug!("Logger already initialized: {}", err);
    }
}

/// Initialize the logging system with a default level
///
/// `RUST_LOG` still overrides the default when it is set.
pub fn init_with_level(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .try_init();

    if let Err(err) = result {
        log::debug!("Logger already initialized: {}", err);
    }
}

/// Parse a level name from configuration, falling back to `Info`
pub fn parse_level(name: &str) -> LevelFilter {
    name.parse().unwrap_or_else(|_| {
        log::warn!("Unknown log level '{}', using info", name);
        LevelFilter::Info
    })
}
