//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! - `info`: command progress and summary counts
//! - `debug`: per-file and per-row detail from the CSV layer
//!
//! `RUST_LOG` takes precedence over the `-v` count when set.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{CliError, CliResult};

pub fn init_logging(verbosity: u8) -> CliResult<()> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
