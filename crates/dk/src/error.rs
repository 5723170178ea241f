//! CLI error types.

use dk_config::ConfigError;
use dk_index::IndexError;
use dk_scan::ScanError;

/// CLI error type. Every variant exits with status 2.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Index(#[from] IndexError),
}
