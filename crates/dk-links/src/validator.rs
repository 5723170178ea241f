//! Reference resolution and result aggregation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use dk_pdf::{PdfError, PdfInfo, PdfInspector};
use dk_scan::{DocKind, DocumentNode, ScanError, Scanner};

use crate::parser::parse_links;
use crate::reference::LinkReference;
use crate::target::{LinkKind, MalformedReason, parse_target};

/// Outcome for a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    BrokenMissingTarget,
    BrokenMalformed(MalformedReason),
    SkippedExternal,
}

impl ValidationResult {
    /// Returns `true` for broken results.
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::BrokenMissingTarget | Self::BrokenMalformed(_))
    }

    /// Short label used in report lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::BrokenMissingTarget => "missing-target",
            Self::BrokenMalformed(_) => "malformed",
            Self::SkippedExternal => "external",
        }
    }
}

/// A reference together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheck {
    pub reference: LinkReference,
    /// Filesystem path the target resolved to, for file targets.
    pub resolved: Option<PathBuf>,
    pub result: ValidationResult,
}

impl fmt::Display for LinkCheck {
    /// `path:line:column -> target [label]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            self.reference.location(),
            self.reference.target,
            self.result.label()
        )
    }
}

/// A file that could not be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableFile {
    /// Path relative to the documentation root.
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for UnreadableFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.to_string_lossy().replace('\\', "/");
        write!(f, "{path}:0:0 -> {path} [unreadable-file]")
    }
}

/// Aggregate counts of a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Markdown files read.
    pub files: usize,
    /// PDF files enumerated.
    pub pdf_files: usize,
    pub total: usize,
    pub valid: usize,
    pub broken_missing: usize,
    pub broken_malformed: usize,
    pub skipped_external: usize,
    pub unreadable: usize,
}

impl Summary {
    /// Broken references of either kind.
    pub fn broken(&self) -> usize {
        self.broken_missing + self.broken_malformed
    }

    fn record(&mut self, result: &ValidationResult) {
        self.total += 1;
        match result {
            ValidationResult::Valid => self.valid += 1,
            ValidationResult::BrokenMissingTarget => self.broken_missing += 1,
            ValidationResult::BrokenMalformed(_) => self.broken_malformed += 1,
            ValidationResult::SkippedExternal => self.skipped_external += 1,
        }
    }
}

/// Everything a validation run found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Checked references in scan order.
    pub checks: Vec<LinkCheck>,
    pub unreadable: Vec<UnreadableFile>,
    pub summary: Summary,
}

impl ValidationReport {
    /// Returns `true` if any reference is broken or any file was unreadable.
    pub fn has_failures(&self) -> bool {
        self.summary.broken() > 0 || self.summary.unreadable > 0
    }

    /// Broken checks in scan order.
    pub fn broken(&self) -> impl Iterator<Item = &LinkCheck> {
        self.checks.iter().filter(|c| c.result.is_broken())
    }

    fn push(&mut self, check: LinkCheck) {
        self.summary.record(&check.result);
        self.checks.push(check);
    }

    fn record_unreadable(&mut self, node: &DocumentNode, reason: String) {
        tracing::warn!(path = %node.path.display(), reason = %reason, "Unreadable file");
        self.summary.unreadable += 1;
        self.unreadable.push(UnreadableFile {
            path: node.rel_path.clone(),
            reason,
        });
    }
}

/// Validation behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorOptions {
    /// Report only references whose target is a `.pdf` file.
    pub pdf_only: bool,
    /// Run the PDF inspector on existing PDF targets and scanned PDFs.
    pub check_pdfs: bool,
    /// Treat paths mentioned in prose as references.
    pub bare_paths: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            pdf_only: false,
            check_pdfs: false,
            bare_paths: true,
        }
    }
}

/// Checks every link in a documentation tree.
///
/// The scanner decides which files are visited; markdown files have their
/// links checked and PDF files only get the optional metadata check.
pub struct LinkValidator {
    scanner: Scanner,
    options: ValidatorOptions,
    inspector: Box<dyn PdfInspector>,
}

impl LinkValidator {
    /// Create a validator inspecting PDFs with `pdfinfo` from `PATH`.
    pub fn new(scanner: Scanner, options: ValidatorOptions) -> Self {
        Self {
            scanner,
            options,
            inspector: Box::new(PdfInfo::default()),
        }
    }

    /// Replace the PDF inspector.
    #[must_use]
    pub fn with_inspector(mut self, inspector: Box<dyn PdfInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Scan the tree and check every reference.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root cannot be listed. Per-file problems
    /// are recorded in the report instead.
    pub fn validate(&self) -> Result<ValidationReport, ScanError> {
        let nodes = self.scanner.scan()?;
        let mut pdfs = PdfCheck {
            inspector: self.options.check_pdfs.then_some(self.inspector.as_ref()),
            seen: HashMap::new(),
        };
        let mut report = ValidationReport::default();

        for node in &nodes {
            match node.kind {
                DocKind::Markdown | DocKind::SummaryMarkdown => {
                    self.validate_markdown(node, &mut pdfs, &mut report);
                }
                DocKind::Pdf => {
                    report.summary.pdf_files += 1;
                    if let Err(message) = pdfs.check(&node.path) {
                        report.record_unreadable(node, format!("unreadable PDF: {message}"));
                    }
                }
                DocKind::Unknown => {}
            }
        }

        let summary = &report.summary;
        tracing::info!(
            files = summary.files,
            references = summary.total,
            broken = summary.broken(),
            external = summary.skipped_external,
            unreadable = summary.unreadable,
            "Validation finished"
        );
        Ok(report)
    }

    fn validate_markdown(
        &self,
        node: &DocumentNode,
        pdfs: &mut PdfCheck<'_>,
        report: &mut ValidationReport,
    ) {
        report.summary.files += 1;
        let content = match fs::read(&node.path).map(String::from_utf8) {
            Ok(Ok(content)) => content,
            Ok(Err(_)) => {
                report.record_unreadable(node, "not valid UTF-8".to_owned());
                return;
            }
            Err(e) => {
                report.record_unreadable(node, e.to_string());
                return;
            }
        };

        let source_dir = node.path.parent().unwrap_or(self.scanner.root());
        let links = parse_links(&content, self.options.bare_paths);
        tracing::debug!(path = %node.rel_path.display(), links = links.len(), "Checking file");

        for raw in links {
            let terminated = raw.terminated;
            let reference = LinkReference::new(node.rel_path.clone(), raw);
            if self.options.pdf_only && !reference.targets_pdf() {
                continue;
            }
            let (result, resolved) = if terminated {
                self.check(&reference, source_dir, pdfs)
            } else {
                (
                    ValidationResult::BrokenMalformed(MalformedReason::Unterminated),
                    None,
                )
            };
            report.push(LinkCheck {
                reference,
                resolved,
                result,
            });
        }
    }

    fn check(
        &self,
        reference: &LinkReference,
        source_dir: &Path,
        pdfs: &mut PdfCheck<'_>,
    ) -> (ValidationResult, Option<PathBuf>) {
        let target = match parse_target(&reference.target) {
            Ok(target) => target,
            Err(reason) => return (ValidationResult::BrokenMalformed(reason), None),
        };

        let resolved = match target.kind {
            LinkKind::ExternalUrl => return (ValidationResult::SkippedExternal, None),
            LinkKind::PageAnchor => return (ValidationResult::Valid, None),
            LinkKind::AbsoluteFile => {
                normalize(&self.scanner.root().join(target.path.trim_start_matches('/')))
            }
            LinkKind::RelativeFile => normalize(&source_dir.join(&target.path)),
        };

        if !resolved.exists() {
            return (ValidationResult::BrokenMissingTarget, Some(resolved));
        }
        if target.is_pdf()
            && resolved.is_file()
            && let Err(message) = pdfs.check(&resolved)
        {
            return (
                ValidationResult::BrokenMalformed(MalformedReason::UnreadablePdf(message)),
                Some(resolved),
            );
        }
        (ValidationResult::Valid, Some(resolved))
    }
}

/// Per-run PDF inspection with a result cache.
struct PdfCheck<'a> {
    /// `None` when checks are off or the tool turned out to be missing.
    inspector: Option<&'a dyn PdfInspector>,
    seen: HashMap<PathBuf, Result<(), String>>,
}

impl PdfCheck<'_> {
    /// `Err` carries the tool's complaint. Files that could not be checked
    /// pass.
    fn check(&mut self, path: &Path) -> Result<(), String> {
        let Some(inspector) = self.inspector else {
            return Ok(());
        };
        if let Some(outcome) = self.seen.get(path) {
            return outcome.clone();
        }

        let outcome = match inspector.inspect(path) {
            Ok(_) => Ok(()),
            Err(e @ PdfError::NotInstalled { .. }) => {
                tracing::warn!(error = %e, "PDF checks skipped");
                self.inspector = None;
                return Ok(());
            }
            Err(PdfError::Failed { stderr, .. }) if stderr.is_empty() => {
                Err("pdfinfo failed".to_owned())
            }
            Err(PdfError::Failed { stderr, .. }) => Err(stderr),
            Err(e @ PdfError::Io { .. }) => {
                tracing::warn!(path = %path.display(), error = %e, "PDF check not run");
                return Ok(());
            }
        };
        self.seen.insert(path.to_path_buf(), outcome.clone());
        outcome
    }
}

/// Resolve `.` and `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use dk_pdf::PdfMetadata;
    use dk_scan::ScanOptions;
    use pretty_assertions::assert_eq;

    use super::*;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn validator(root: &Path, pdfs: bool, options: ValidatorOptions) -> LinkValidator {
        let scan = ScanOptions {
            pdfs,
            ..ScanOptions::default()
        };
        LinkValidator::new(Scanner::new(root, scan).unwrap(), options)
    }

    fn validate(root: &Path) -> ValidationReport {
        validator(root, false, ValidatorOptions::default())
            .validate()
            .unwrap()
    }

    fn lines(report: &ValidationReport) -> Vec<String> {
        report.checks.iter().map(ToString::to_string).collect()
    }

    /// Inspector that rejects files named in `bad` and counts calls.
    struct FakeInspector {
        bad: &'static [&'static str],
        missing: bool,
        calls: Rc<Cell<usize>>,
    }

    impl FakeInspector {
        fn boxed(bad: &'static [&'static str], missing: bool) -> (Box<Self>, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let inspector = Box::new(Self {
                bad,
                missing,
                calls: Rc::clone(&calls),
            });
            (inspector, calls)
        }
    }

    impl PdfInspector for FakeInspector {
        fn inspect(&self, path: &Path) -> Result<PdfMetadata, PdfError> {
            self.calls.set(self.calls.get() + 1);
            if self.missing {
                return Err(PdfError::NotInstalled {
                    binary: PathBuf::from("pdfinfo"),
                });
            }
            let name = path.file_name().unwrap().to_string_lossy();
            if self.bad.contains(&name.as_ref()) {
                return Err(PdfError::Failed {
                    binary: PathBuf::from("pdfinfo"),
                    path: path.to_path_buf(),
                    stderr: "Syntax Error: Couldn't find trailer dictionary".to_owned(),
                });
            }
            Ok(PdfMetadata::default())
        }
    }

    #[test]
    fn test_missing_target() {
        let dir = create_test_dir();
        write(dir.path(), "docs/guide.md", "# Guide\n\n[see](missing.md)\n");

        let report = validate(dir.path());

        assert_eq!(lines(&report), vec!["docs/guide.md:3:1 -> missing.md [missing-target]"]);
        assert_eq!(report.summary.broken_missing, 1);
        assert!(report.has_failures());
    }

    #[test]
    fn test_empty_root() {
        let dir = create_test_dir();
        let report = validate(dir.path());

        assert_eq!(report, ValidationReport::default());
        assert!(!report.has_failures());
    }

    #[test]
    fn test_resolution_rules() {
        let dir = create_test_dir();
        write(dir.path(), "a/x.md", "# X");
        write(dir.path(), "b/my file.md", "# Mine");
        write(dir.path(), "b/manual.pdf", "%PDF");
        write(dir.path(), "b/x(1).md", "# One");
        write(
            dir.path(),
            "b/index.md",
            "\
[rel](../a/x.md) [abs](/a/x.md) [dot](./manual.pdf)
[space](my%20file.md) [page](manual.pdf#page=3) [anchor](#usage)
[a [nested] text](x\\(1\\).md) <a href=\"/b/manual.pdf\">pdf</a>
[web](https://example.com/missing.md) see also ../a/x.md
",
        );

        let report = validate(dir.path());

        assert_eq!(report.summary.total, 10);
        assert_eq!(report.summary.valid, 9);
        assert_eq!(report.summary.skipped_external, 1);
        assert!(!report.has_failures(), "{:?}", lines(&report));

        let page = report
            .checks
            .iter()
            .find(|c| c.reference.target == "manual.pdf#page=3")
            .unwrap();
        assert_eq!(page.reference.anchor, Some(crate::Anchor::Page(3)));
        assert_eq!(page.resolved, Some(dir.path().canonicalize().unwrap().join("b/manual.pdf")));
    }

    #[test]
    fn test_external_links_are_not_resolved() {
        let dir = create_test_dir();
        write(dir.path(), "a.md", "[x](http://localhost/nothing.md) [y](//cdn/z.pdf)");

        let report = validate(dir.path());

        assert_eq!(report.summary.skipped_external, 2);
        assert!(report.checks.iter().all(|c| c.resolved.is_none()));
    }

    #[test]
    fn test_malformed_targets() {
        let dir = create_test_dir();
        write(dir.path(), "manual.pdf", "%PDF");
        write(
            dir.path(),
            "a.md",
            "[a]() [b](manual.pdf#page=abc)\n[c](unclosed.md\n",
        );

        let report = validate(dir.path());

        assert_eq!(
            lines(&report),
            vec![
                "a.md:1:1 ->  [malformed]",
                "a.md:1:7 -> manual.pdf#page=abc [malformed]",
                "a.md:2:1 -> unclosed.md [malformed]",
            ]
        );
        assert_eq!(
            report.checks[2].result,
            ValidationResult::BrokenMalformed(MalformedReason::Unterminated)
        );
        assert_eq!(report.summary.broken_malformed, 3);
    }

    #[test]
    fn test_bare_paths_in_prose() {
        let dir = create_test_dir();
        write(dir.path(), "notes.md.bak", "old");
        write(dir.path(), "archive.pdf.gz", "old");
        write(dir.path(), "a.md", "Restore from notes.md.bak or archive.pdf.gz\n");
        write(dir.path(), "x/y/c.md", "See ../../gone.md for details\n");

        let report = validate(dir.path());

        assert_eq!(lines(&report), vec!["x/y/c.md:1:5 -> ../../gone.md [missing-target]"]);
        assert_eq!(report.summary.broken_missing, 1);
    }

    #[test]
    fn test_fenced_links_ignored() {
        let dir = create_test_dir();
        write(dir.path(), "a.md", "```\n[x](missing.md)\n```\n");

        let report = validate(dir.path());

        assert_eq!(report.summary.total, 0);
    }

    #[test]
    fn test_unreadable_file_is_recorded() {
        let dir = create_test_dir();
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, b'[', b']']).unwrap();
        write(dir.path(), "good.md", "[ok](bad.md)");

        let report = validate(dir.path());

        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(
            report.unreadable[0].to_string(),
            "bad.md:0:0 -> bad.md [unreadable-file]"
        );
        assert_eq!(report.summary.valid, 1);
        assert!(report.has_failures());
    }

    #[test]
    fn test_pdf_only_filters_references() {
        let dir = create_test_dir();
        write(dir.path(), "a.md", "[x](gone.md) [y](gone.pdf#page=2)");

        let options = ValidatorOptions {
            pdf_only: true,
            ..ValidatorOptions::default()
        };
        let report = validator(dir.path(), false, options).validate().unwrap();

        assert_eq!(lines(&report), vec!["a.md:1:14 -> gone.pdf#page=2 [missing-target]"]);
    }

    #[test]
    fn test_check_pdfs_marks_unreadable_targets() {
        let dir = create_test_dir();
        write(dir.path(), "good.pdf", "%PDF");
        write(dir.path(), "broken.pdf", "not a pdf");
        write(dir.path(), "a.md", "[g](good.pdf) [b](broken.pdf) [b2](broken.pdf#page=1)");

        let (inspector, calls) = FakeInspector::boxed(&["broken.pdf"], false);
        let options = ValidatorOptions {
            check_pdfs: true,
            ..ValidatorOptions::default()
        };
        let report = validator(dir.path(), false, options)
            .with_inspector(inspector)
            .validate()
            .unwrap();

        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.broken_malformed, 2);
        assert!(matches!(
            &report.checks[1].result,
            ValidationResult::BrokenMalformed(MalformedReason::UnreadablePdf(m)) if m.contains("trailer")
        ));
        // Each file is inspected once.
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_check_pdfs_off_never_inspects() {
        let dir = create_test_dir();
        write(dir.path(), "broken.pdf", "x");
        write(dir.path(), "a.md", "[b](broken.pdf)");

        let (inspector, calls) = FakeInspector::boxed(&["broken.pdf"], false);
        let report = validator(dir.path(), true, ValidatorOptions::default())
            .with_inspector(inspector)
            .validate()
            .unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.summary.pdf_files, 1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_missing_pdfinfo_skips_checks_once() {
        let dir = create_test_dir();
        write(dir.path(), "a.pdf", "%PDF");
        write(dir.path(), "b.pdf", "%PDF");
        write(dir.path(), "index.md", "[a](a.pdf) [b](b.pdf)");

        let (inspector, calls) = FakeInspector::boxed(&[], true);
        let options = ValidatorOptions {
            check_pdfs: true,
            ..ValidatorOptions::default()
        };
        let report = validator(dir.path(), true, options)
            .with_inspector(inspector)
            .validate()
            .unwrap();

        assert!(!report.has_failures());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_scanned_pdfs_checked_as_files() {
        let dir = create_test_dir();
        write(dir.path(), "docs/broken.pdf", "x");
        write(dir.path(), "docs/fine.pdf", "%PDF");

        let (inspector, _) = FakeInspector::boxed(&["broken.pdf"], false);
        let options = ValidatorOptions {
            check_pdfs: true,
            ..ValidatorOptions::default()
        };
        let report = validator(dir.path(), true, options)
            .with_inspector(inspector)
            .validate()
            .unwrap();

        assert_eq!(report.summary.pdf_files, 2);
        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(report.unreadable[0].path, PathBuf::from("docs/broken.pdf"));
        assert!(report.unreadable[0].reason.starts_with("unreadable PDF"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d.md")), PathBuf::from("/a/c/d.md"));
        assert_eq!(normalize(Path::new("/../x.md")), PathBuf::from("/x.md"));
    }
}
