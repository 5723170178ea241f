//! `dk validate` command implementation.

use std::path::PathBuf;

use clap::Args;
use dk_config::{CliSettings, Config};
use dk_links::{LinkValidator, Summary, ValidationResult, ValidatorOptions};
use dk_pdf::PdfInfo;
use dk_scan::Scanner;

use super::{Status, scan_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the validate command.
#[derive(Args)]
pub(crate) struct ValidateArgs {
    /// Documentation root directory.
    root: PathBuf,

    /// Also enumerate PDF files (inspected with --check-pdfs).
    #[arg(long)]
    include_pdfs: bool,

    /// Only report references whose target is a PDF file.
    #[arg(long)]
    pdf_only: bool,

    /// Report broken links without failing.
    #[arg(short, long)]
    warn_only: bool,

    /// Inspect linked PDF files with pdfinfo.
    #[arg(long)]
    check_pdfs: bool,

    /// pdfinfo binary to run (default: tools.pdfinfo, else pdfinfo on PATH).
    #[arg(long, value_name = "PATH")]
    pdfinfo: Option<PathBuf>,

    /// Print valid and skipped references too, and enable info logs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to configuration file (default: auto-discover dk.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the root cannot be scanned.
    pub(crate) fn execute(self) -> Result<Status, CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            warn_only: self.warn_only.then_some(true),
            include_pdfs: self.include_pdfs.then_some(true),
            check_pdfs: self.check_pdfs.then_some(true),
            pdfinfo: self.pdfinfo.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let scanner = Scanner::new(
            &self.root,
            scan_options(&config, config.validate.include_pdfs)?,
        )?;
        let options = ValidatorOptions {
            pdf_only: self.pdf_only,
            check_pdfs: config.validate.check_pdfs,
            bare_paths: config.validate.bare_paths,
        };
        let inspector = PdfInfo::new(config.tools_resolved.pdfinfo.clone());
        let report = LinkValidator::new(scanner, options)
            .with_inspector(Box::new(inspector))
            .validate()?;

        for check in &report.checks {
            if check.result.is_broken() || self.verbose {
                output.report(&check.to_string());
            }
            if self.verbose
                && let ValidationResult::BrokenMalformed(reason) = &check.result
            {
                output.detail(&format!("  {reason}"));
            }
        }
        for file in &report.unreadable {
            output.report(&file.to_string());
            if self.verbose {
                output.detail(&format!("  {}", file.reason));
            }
        }

        print_summary(&output, &report.summary);

        if !report.has_failures() {
            output.success("No broken links found");
            return Ok(Status::Success);
        }
        let problems = report.summary.broken() + report.summary.unreadable;
        if config.validate.warn_only {
            output.warning(&format!("{problems} problem(s) found (warn-only)"));
            Ok(Status::Success)
        } else {
            output.error(&format!("{problems} problem(s) found"));
            Ok(Status::LinksBroken)
        }
    }
}

fn print_summary(output: &Output, summary: &Summary) {
    output.highlight("Link validation summary");
    output.info(&format!("  Files checked:      {}", summary.files));
    if summary.pdf_files > 0 {
        output.info(&format!("  PDF files:          {}", summary.pdf_files));
    }
    output.info(&format!("  References:         {}", summary.total));
    output.info(&format!("  Valid:              {}", summary.valid));
    output.info(&format!("  Missing target:     {}", summary.broken_missing));
    output.info(&format!("  Malformed:          {}", summary.broken_malformed));
    output.info(&format!("  External (skipped): {}", summary.skipped_external));
    output.info(&format!("  Unreadable files:   {}", summary.unreadable));
}
