//! Document nodes discovered during a scan.

use std::path::{Path, PathBuf};

/// Suffix marking a markdown summary of another document (`report-summary.md`).
const SUMMARY_SUFFIX: &str = "-summary";

/// The kind of documentation artifact a file represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    /// Markdown file (`.md`, `.markdown`).
    Markdown,
    /// Markdown summary of a sibling document (`<stem>-summary.md`).
    SummaryMarkdown,
    /// PDF file.
    Pdf,
    /// Anything else. Never produced by a scan.
    Unknown,
}

impl DocKind {
    /// Classify a path by its extension and filename.
    ///
    /// Extension matching is case-insensitive.
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            return Self::Unknown;
        };

        match ext.as_str() {
            "md" | "markdown" => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                if stem.len() > SUMMARY_SUFFIX.len() && stem.ends_with(SUMMARY_SUFFIX) {
                    Self::SummaryMarkdown
                } else {
                    Self::Markdown
                }
            }
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` for kinds whose content is markdown text.
    pub fn is_markdown(self) -> bool {
        matches!(self, Self::Markdown | Self::SummaryMarkdown)
    }
}

/// Where a node's title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// `title` key of the YAML frontmatter.
    Frontmatter,
    /// First level-1 heading.
    Heading,
    /// Humanized filename.
    Filename,
}

/// One documentation artifact found under the documentation root.
///
/// Built once per scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Path relative to the documentation root.
    pub rel_path: PathBuf,
    /// Artifact kind.
    pub kind: DocKind,
    /// Display title.
    pub title: String,
    /// Where `title` came from.
    pub title_source: TitleSource,
    /// Frontmatter description or first prose line (markdown only).
    pub description: Option<String>,
}

impl DocumentNode {
    /// Filename including extension.
    pub fn file_name(&self) -> String {
        self.rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Filename without extension.
    pub fn stem(&self) -> String {
        self.rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Containing folder relative to the root (`""` for the root itself).
    pub fn folder(&self) -> &Path {
        self.rel_path.parent().unwrap_or(Path::new(""))
    }

    /// Key shared by a document and its siblings: the lowercased stem,
    /// with the `-summary` suffix removed for summaries.
    pub fn sibling_key(&self) -> String {
        let stem = self.stem().to_lowercase();
        if self.kind == DocKind::SummaryMarkdown {
            stem.strip_suffix(SUMMARY_SUFFIX).unwrap_or(&stem).to_owned()
        } else {
            stem
        }
    }

    /// `rel_path` with `/` separators on every platform.
    pub fn rel_path_slash(&self) -> String {
        self.rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
