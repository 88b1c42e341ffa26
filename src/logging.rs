//! Diagnostics logging. Records go to the sinks; everything else goes
//! through `tracing` to stderr so stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, Result};

/// Filter from `RUST_LOG` when set, else from `level`.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }
    EnvFilter::try_new(level).map_err(|e| Error::Config(format!("invalid log level {level:?}: {e}")))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: &str) -> Result<()> {
    let filter = build_filter(level)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| Error::Config(format!("logger already initialised: {e}")))
}
