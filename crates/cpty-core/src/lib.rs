//! cpty core - shared configuration and error types
//!
//! This crate defines the pieces shared by the extractor and the CLI:
//! - Extraction thresholds and logging settings
//! - Common error types for the fallible edges (files, config, manifests)
//!
//! The extraction itself never fails; only the I/O around it does.

pub mod config;

pub use config::{AppConfig, ConfigError, ExtractorConfig, LoggingConfig};

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised around extraction: reading inputs, configuration, manifests
#[derive(Error, Debug)]
pub enum CptyError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CptyError {
    /// Wrap an IO error with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CptyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = CptyError::io(
            "deal.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "IO error reading deal.txt: missing");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: CptyError = ConfigError::InvalidValue {
            key: "LOG_JSON".to_string(),
            value: "maybe".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid value for LOG_JSON: maybe");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<Vec<String>, _> = serde_json::from_str("{");
        let err: CptyError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Malformed JSON"));
    }
}
