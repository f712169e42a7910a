// Logging setup. Diagnostics go to stderr through `tracing` so they never
// interleave with the prompts on stdout; `RUST_LOG` overrides the default
// filter (e.g. `RUST_LOG=blobshift=debug` to see every signed request).

use crate::error::{Result, TransferError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "blobshift=warn";

pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| TransferError::Io(std::io::Error::other(e.to_string())))
}
