//! Document discovery by filesystem walking.
//!
//! The walk is deterministic: entries of every directory are visited in
//! byte order of their names, so two scans of an unchanged tree yield the
//! same node sequence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::document::{DocKind, DocumentNode};
use crate::title::DerivedTitle;

/// Error returned when a scan cannot start or the root cannot be listed.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Root is missing or not a directory.
    #[error("Documentation root is not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),
    /// I/O failure on the root itself.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// What a scan collects and what it skips.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Collect markdown files (including summaries).
    pub markdown: bool,
    /// Collect PDF files.
    pub pdfs: bool,
    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against paths relative to the root.
    pub exclude: Vec<Pattern>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            markdown: true,
            pdfs: true,
            exclude_dirs: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl ScanOptions {
    /// Returns `true` if files of `kind` are collected.
    fn wants(&self, kind: DocKind) -> bool {
        match kind {
            DocKind::Markdown | DocKind::SummaryMarkdown => self.markdown,
            DocKind::Pdf => self.pdfs,
            DocKind::Unknown => false,
        }
    }

    fn is_excluded(&self, rel_path: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(rel_path))
    }
}

/// Walks a documentation root and builds [`DocumentNode`]s.
///
/// Hidden entries (names starting with `.`) are always skipped. Markdown
/// titles are read from file content during the walk; a file that cannot be
/// read falls back to its filename title.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    options: ScanOptions,
}

impl Scanner {
    /// Create a scanner for `root`.
    ///
    /// The root is canonicalized so node paths are absolute.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidRoot`] if `root` is not a directory.
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Result<Self, ScanError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ScanError::InvalidRoot(root));
        }
        let root = fs::canonicalize(&root).map_err(|source| ScanError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root, options })
    }

    /// Canonical documentation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and return every collected document.
    ///
    /// Unreadable subdirectories are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Io`] if the root itself cannot be listed.
    pub fn scan(&self) -> Result<Vec<DocumentNode>, ScanError> {
        let mut nodes = Vec::new();
        self.scan_directory(&self.root, Path::new(""), &mut nodes)
            .map_err(|source| ScanError::Io {
                path: self.root.clone(),
                source,
            })?;
        tracing::debug!(root = %self.root.display(), count = nodes.len(), "Scan completed");
        Ok(nodes)
    }

    fn scan_directory(
        &self,
        dir_path: &Path,
        rel_dir: &Path,
        nodes: &mut Vec<DocumentNode>,
    ) -> io::Result<()> {
        let mut entries: Vec<_> = fs::read_dir(dir_path)?.filter_map(Result::ok).collect();
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let rel_path = rel_dir.join(&name);
            if self.options.is_excluded(&rel_path) {
                tracing::debug!(path = %rel_path.display(), "Excluded by pattern");
                continue;
            }

            // Symlinked directories are not followed; symlinked files are.
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if self.options.exclude_dirs.iter().any(|d| *d == name_str) {
                    continue;
                }
                if let Err(e) = self.scan_directory(&path, &rel_path, nodes) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read directory, skipping");
                }
                continue;
            }
            if !path.is_file() {
                continue;
            }

            let kind = DocKind::from_path(&path);
            if self.options.wants(kind) {
                nodes.push(Self::build_node(path, rel_path, kind));
            }
        }

        Ok(())
    }

    fn build_node(path: PathBuf, rel_path: PathBuf, kind: DocKind) -> DocumentNode {
        let file_name = rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let derived = if kind.is_markdown() {
            match fs::read_to_string(&path) {
                Ok(content) => DerivedTitle::from_markdown(&content, &file_name),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read file, using filename title");
                    DerivedTitle::from_filename(&file_name)
                }
            }
        } else {
            DerivedTitle::from_filename(&file_name)
        };

        DocumentNode {
            path,
            rel_path,
            kind,
            title: derived.title,
            title_source: derived.source,
            description: derived.description,
        }
    }
}
