//! PDF metadata through poppler's `pdfinfo`.
//!
//! PDF files are never parsed here. [`PdfInfo`] runs the external `pdfinfo`
//! binary and parses its `Key: Value` output into [`PdfMetadata`]. The
//! [`PdfInspector`] trait lets callers substitute the process in tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Metadata reported by `pdfinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfMetadata {
    /// Document title, if set and non-empty.
    pub title: Option<String>,
    /// Document author, if set and non-empty.
    pub author: Option<String>,
    /// Document subject, if set and non-empty.
    pub subject: Option<String>,
    /// Page count.
    pub pages: Option<u32>,
}

impl PdfMetadata {
    /// Parse `pdfinfo` stdout.
    ///
    /// Lines without a `:` are ignored and values are trimmed. Unknown keys
    /// (`Producer`, `PDF version`, ...) are dropped.
    pub fn parse(stdout: &str) -> Self {
        let fields: BTreeMap<String, String> = stdout
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
            .filter(|(key, _)| !key.is_empty())
            .collect();

        let non_empty = |key: &str| fields.get(key).filter(|v| !v.is_empty()).cloned();

        Self {
            title: non_empty("Title"),
            author: non_empty("Author"),
            subject: non_empty("Subject"),
            pages: fields.get("Pages").and_then(|p| p.parse().ok()),
        }
    }
}

/// Error returned when a PDF cannot be inspected.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The inspection binary could not be found.
    #[error("{} not found (install poppler-utils)", .binary.display())]
    NotInstalled {
        /// Binary that was looked up.
        binary: PathBuf,
    },
    /// The tool ran and rejected the file.
    #[error("{} rejected {}: {stderr}", .binary.display(), .path.display())]
    Failed {
        /// Binary that ran.
        binary: PathBuf,
        /// Inspected file.
        path: PathBuf,
        /// Trimmed stderr of the tool.
        stderr: String,
    },
    /// Spawning the tool failed for another reason.
    #[error("Failed to run {}: {source}", .binary.display())]
    Io {
        /// Binary that failed to start.
        binary: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// Reads metadata from PDF files.
pub trait PdfInspector {
    /// Inspect the PDF at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the tool is missing or rejects the file.
    fn inspect(&self, path: &Path) -> Result<PdfMetadata, PdfError>;
}

/// [`PdfInspector`] backed by the `pdfinfo` command-line tool.
#[derive(Debug, Clone)]
pub struct PdfInfo {
    binary: PathBuf,
}

impl PdfInfo {
    /// Use `binary` (a name looked up on `PATH`, or a path) as `pdfinfo`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for PdfInfo {
    fn default() -> Self {
        Self::new("pdfinfo")
    }
}

impl PdfInspector for PdfInfo {
    fn inspect(&self, path: &Path) -> Result<PdfMetadata, PdfError> {
        let output = Command::new(&self.binary)
            .arg(path)
            .output()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => PdfError::NotInstalled {
                    binary: self.binary.clone(),
                },
                _ => PdfError::Io {
                    binary: self.binary.clone(),
                    source,
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            tracing::debug!(path = %path.display(), stderr = %stderr, "pdfinfo failed");
            return Err(PdfError::Failed {
                binary: self.binary.clone(),
                path: path.to_path_buf(),
                stderr,
            });
        }

        let metadata = PdfMetadata::parse(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(path = %path.display(), pages = ?metadata.pages, "PDF inspected");
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Title:          Annual Report
Author:         Finance Team
Subject:        Fiscal year 2023
Creator:        LaTeX with hyperref
Producer:       pdfTeX-1.40.25
CreationDate:   Tue Mar  5 10:12:01 2024 CET
Tagged:         no
Pages:          42
Page size:      595.276 x 841.89 pts (A4)
PDF version:    1.5
";

    #[test]
    fn test_parse_pdfinfo_output() {
        let meta = PdfMetadata::parse(SAMPLE);

        assert_eq!(meta.title, Some("Annual Report".to_owned()));
        assert_eq!(meta.author, Some("Finance Team".to_owned()));
        assert_eq!(meta.subject, Some("Fiscal year 2023".to_owned()));
        assert_eq!(meta.pages, Some(42));
    }

    #[test]
    fn test_parse_empty_title_is_none() {
        let meta = PdfMetadata::parse("Title:\nSubject:  \nPages: x\n");
        assert_eq!(meta, PdfMetadata::default());
    }

    #[test]
    fn test_missing_binary() {
        let inspector = PdfInfo::new("/nonexistent/bin/pdfinfo");
        let err = inspector.inspect(Path::new("doc.pdf")).unwrap_err();
        assert!(matches!(err, PdfError::NotInstalled { .. }), "{err:?}");
        assert!(err.to_string().contains("poppler"));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-pdfinfo");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_inspect_runs_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "#!/bin/sh\nprintf 'Title: Guide\\nPages: 3\\n'\n",
        );

        let meta = PdfInfo::new(tool).inspect(Path::new("guide.pdf")).unwrap();

        assert_eq!(meta.title, Some("Guide".to_owned()));
        assert_eq!(meta.pages, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_inspect_reports_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "#!/bin/sh\necho 'Syntax Error: Couldn'\\''t find trailer dictionary' >&2\nexit 1\n",
        );

        let err = PdfInfo::new(tool).inspect(Path::new("broken.pdf")).unwrap_err();

        match err {
            PdfError::Failed { path, stderr, .. } => {
                assert_eq!(path, PathBuf::from("broken.pdf"));
                assert!(stderr.contains("trailer"), "{stderr}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
