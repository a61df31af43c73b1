//! SIGINT/SIGTERM wiring for graceful cancellation.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::core::errors::{FqhError, Result};

/// Arrange for SIGINT and SIGTERM to set `flag`. The running pass checks the
/// flag between files and between phases, so the first signal stops the pass
/// at the next safe point instead of killing it mid-move.
pub fn install_cancel_handler(flag: &Arc<AtomicBool>) -> Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(flag)).map_err(|error| {
            FqhError::Runtime {
                details: format!("failed to install signal handler: {error}"),
            }
        })?;
    }
    Ok(())
}
