//! Tracing subscriber setup

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    #[error("Invalid log filter {directive:?}: {reason}")]
    InvalidFilter { directive: String, reason: String },
}

/// Install a fmt subscriber filtered by `level` (an `EnvFilter` directive
/// such as `"info"` or `"lana_core=debug"`). An empty `level` reads
/// `RUST_LOG` instead. Later calls are no-ops.
pub fn init(level: &str) -> Result<(), LoggingError> {
    let filter = if level.trim().is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter {
            directive: level.to_string(),
            reason: err.to_string(),
        })?
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init("debug").is_ok());
        assert!(init("lana_core=trace").is_ok());
        assert!(init("").is_ok());
    }

    #[test]
    fn test_bad_directive_is_reported() {
        let err = init("lana_core=loudest").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { ref directive, .. } if directive == "lana_core=loudest"));
    }
}
