//! # Logging Setup
//!
//! Costruisce il subscriber `tracing` del processo: una copia dei log su
//! stderr e una nel file di log persistente (append, senza colori).
//! Il subscriber viene creato esplicitamente e installato da `main`.
//!
//! Livello: INFO di default, DEBUG con `--verbose`; `RUST_LOG` ha la precedenza.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the subscriber mirroring log lines to stderr and `log_file`.
pub fn build_subscriber(verbose: bool, log_file: Option<&Path>) -> Result<impl Subscriber + Send + Sync + 'static> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer))
}
