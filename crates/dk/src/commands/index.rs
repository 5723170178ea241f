//! `dk index` command implementation.

use std::path::PathBuf;

use clap::{ArgAction, Args};
use dk_config::{CliSettings, Config};
use dk_index::{IndexGenerator, IndexOptions};
use dk_pdf::PdfInfo;
use dk_scan::Scanner;

use super::{Status, scan_options};
use crate::error::CliError;
use crate::output::Output;

/// Default index filename, placed under the documentation root.
const DEFAULT_INDEX: &str = "INDEX.md";

/// Arguments for the index command.
#[derive(Args)]
pub(crate) struct IndexArgs {
    /// Documentation root directory.
    root: PathBuf,

    /// Index file to write (default: INDEX.md under the root).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include PDF files (default: true; `--include-pdfs=false` lists markdown only).
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    include_pdfs: bool,

    /// Only list entries whose base document is a PDF.
    #[arg(long)]
    pdf_only: bool,

    /// Read PDF titles and page counts with pdfinfo.
    #[arg(long)]
    pdf_metadata: bool,

    /// pdfinfo binary to run (default: tools.pdfinfo, else pdfinfo on PATH).
    #[arg(long, value_name = "PATH")]
    pdfinfo: Option<PathBuf>,

    /// Enable info logs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to configuration file (default: auto-discover dk.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl IndexArgs {
    /// Execute the index command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the root cannot be scanned
    /// or the index cannot be written.
    pub(crate) fn execute(self) -> Result<Status, CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            index_output: self.output.clone(),
            pdf_metadata: self.pdf_metadata.then_some(true),
            pdfinfo: self.pdfinfo.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let pdfs = self.include_pdfs || self.pdf_only;
        let scanner = Scanner::new(&self.root, scan_options(&config, pdfs)?)?;

        let index_path = config
            .index_resolved
            .output
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_INDEX));
        let options = IndexOptions {
            output: index_path,
            pdf_only: self.pdf_only,
            pdf_metadata: config.index_resolved.pdf_metadata,
        };
        let inspector = PdfInfo::new(config.tools_resolved.pdfinfo.clone());
        let summary = IndexGenerator::new(scanner, options)
            .with_inspector(Box::new(inspector))
            .generate()?;

        output.success(&format!(
            "Index written to {} ({} entries in {} groups)",
            summary.output.display(),
            summary.entries,
            summary.groups
        ));
        Ok(Status::Success)
    }
}
