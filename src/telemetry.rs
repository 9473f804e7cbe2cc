//! Logging setup
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the host. [`init_tracing`] is a convenience for hosts that want plain
//! formatted output filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Install a global `fmt` subscriber.
///
/// The filter comes from `RUST_LOG` when set and valid, otherwise from
/// `default_directive` (e.g. `"companion_core=info"`).
///
/// # Errors
///
/// Returns [`Error::Other`] if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to initialize tracing: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Another test in this binary may have won the race; either way the
        // last call must report an existing subscriber.
        let _ = init_tracing("companion_core=debug");
        let err = init_tracing("companion_core=debug").unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("tracing"));
    }
}
