//! CLI command implementations.

use std::process::ExitCode;

use dk_config::Config;
use dk_scan::ScanOptions;

use crate::error::CliError;

pub(crate) mod index;
pub(crate) mod validate;

pub(crate) use index::IndexArgs;
pub(crate) use validate::ValidateArgs;

/// Outcome of a command, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// Exit 0.
    Success,
    /// Exit 1: broken links were found.
    LinksBroken,
    /// Exit 2: invalid root, configuration or I/O failure.
    Error,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => Self::SUCCESS,
            Status::LinksBroken => Self::from(1),
            Status::Error => Self::from(2),
        }
    }
}

/// Scan options shared by both commands.
fn scan_options(config: &Config, pdfs: bool) -> Result<ScanOptions, CliError> {
    Ok(ScanOptions {
        markdown: true,
        pdfs,
        exclude_dirs: config.scan.exclude_dirs.clone(),
        exclude: config.exclude_patterns()?,
    })
}
