//! Index file generation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dk_pdf::{PdfInfo, PdfInspector};
use dk_scan::{DocKind, ScanError, Scanner};

use crate::entry::{IndexGroup, build_groups};
use crate::render::render;

/// Error returned by [`IndexGenerator::generate`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Failed to write index {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// What goes into the index and where it is written.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Index file path.
    pub output: PathBuf,
    /// Keep only entries whose base document is a PDF.
    pub pdf_only: bool,
    /// Read PDF titles and page counts with the inspector.
    pub pdf_metadata: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    /// Absolute path of the written file.
    pub output: PathBuf,
    pub groups: usize,
    pub entries: usize,
    pub bytes: usize,
}

/// Builds and writes the documentation index.
pub struct IndexGenerator {
    scanner: Scanner,
    options: IndexOptions,
    inspector: Box<dyn PdfInspector>,
}

impl IndexGenerator {
    /// Create a generator reading PDF metadata with `pdfinfo` from `PATH`.
    pub fn new(scanner: Scanner, options: IndexOptions) -> Self {
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

    /// Scan the tree and build the index groups, leaving out `exclude`.
    pub fn collect(&self, exclude: Option<&Path>) -> Result<Vec<IndexGroup>, IndexError> {
        let nodes: Vec<_> = self
            .scanner
            .scan()?
            .into_iter()
            .filter(|n| Some(n.path.as_path()) != exclude)
            .collect();

        let inspector = self.options.pdf_metadata.then_some(self.inspector.as_ref());
        let mut groups = build_groups(nodes, inspector);

        if self.options.pdf_only {
            for group in &mut groups {
                group
                    .entries
                    .retain(|e| DocKind::from_path(&e.base) == DocKind::Pdf);
            }
            groups.retain(|g| !g.entries.is_empty());
        }
        Ok(groups)
    }

    /// Write the index, creating parent directories and replacing any
    /// previous file. The index file itself is never listed.
    pub fn generate(&self) -> Result<IndexSummary, IndexError> {
        let write_error = |source| IndexError::Write {
            path: self.options.output.clone(),
            source,
        };

        let output = self.output_path().map_err(write_error)?;
        let index_dir = output.parent().unwrap_or(self.scanner.root());

        let groups = self.collect(Some(output.as_path()))?;
        let content = render(&groups, self.scanner.root(), index_dir);
        fs::write(&output, &content).map_err(write_error)?;

        let summary = IndexSummary {
            groups: groups.len(),
            entries: groups.iter().map(|g| g.entries.len()).sum(),
            bytes: content.len(),
            output,
        };
        tracing::info!(
            path = %summary.output.display(),
            groups = summary.groups,
            entries = summary.entries,
            "Index written"
        );
        Ok(summary)
    }

    /// Absolute output path with its parent created and canonicalized, so it
    /// compares equal to scanned node paths.
    fn output_path(&self) -> io::Result<PathBuf> {
        let output = &self.options.output;
        let file_name = output.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "index path has no file name")
        })?;
        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        Ok(fs::canonicalize(parent)?.join(file_name))
    }
}
