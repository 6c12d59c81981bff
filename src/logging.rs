//! Tracing subscriber setup.
//!
//! Log lines are appended to `investing.log` in the save directory. With
//! `--foreground` they are also mirrored to stdout. `RUST_LOG` overrides the
//! default `info` filter.

use crate::domain::error::InvestingError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "investing.log";

/// Install the global subscriber. A second call is a no-op.
pub fn init(log_dir: Option<&Path>, foreground: bool) -> Result<(), InvestingError> {
    let file_layer = match log_dir {
        Some(dir) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stdout_layer = foreground.then(|| fmt::layer().with_writer(std::io::stdout));
    // Without a log file, warnings still need somewhere to go
    let stderr_layer =
        (!foreground && log_dir.is_none()).then(|| fmt::layer().with_writer(std::io::stderr));

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(file_layer)
        .with(stdout_layer)
        .with(stderr_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}
