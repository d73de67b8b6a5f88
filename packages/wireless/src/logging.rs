//! Diagnostics output.
//!
//! Everything in the workspace logs through `tracing`; this installs the
//! subscriber that prints it.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::LoggingError;
use crate::settings::Settings;

/// The filter directive the settings ask for.
pub fn directive(settings: &Settings) -> &str {
    if settings.debug_mode {
        "debug"
    } else {
        settings.log_level.as_str()
    }
}

/// `RUST_LOG` when set, otherwise [`directive`], otherwise `info`.
pub fn filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(settings)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Fails if one is already installed, which callers are free to ignore.
pub fn init(settings: &Settings) -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(filter(settings))
        .with(fmt::layer().with_target(settings.debug_mode))
        .try_init()
        .map_err(|e| LoggingError(e.to_string()))
}
