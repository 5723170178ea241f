//! Sibling pairing and folder grouping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dk_pdf::{PdfError, PdfInspector, PdfMetadata};
use dk_scan::{DocKind, DocumentNode, TitleSource};

/// One line of the index: a base document and its companions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// File stem of the base document.
    pub stem: String,
    /// Base document, relative to the documentation root.
    pub base: PathBuf,
    /// Display title.
    pub title: String,
    /// Markdown sibling of a PDF base.
    pub markdown: Option<PathBuf>,
    /// `-summary.md` sibling.
    pub summary: Option<PathBuf>,
    /// Description of the base or a sibling, else the PDF subject.
    pub description: Option<String>,
    /// Page count of a PDF base, when metadata was read.
    pub pages: Option<u32>,
    /// Author of a PDF base, when metadata was read.
    pub author: Option<String>,
}

impl IndexEntry {
    /// Entry for `base` without siblings.
    pub fn new(stem: impl Into<String>, base: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            base: base.into(),
            title: title.into(),
            markdown: None,
            summary: None,
            description: None,
            pages: None,
            author: None,
        }
    }

    /// File name of the base document.
    pub fn file_name(&self) -> String {
        self.base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn from_markdown(base: DocumentNode, summary: Option<DocumentNode>) -> Self {
        let description = base
            .description
            .clone()
            .or_else(|| summary.as_ref().and_then(|s| s.description.clone()));
        Self {
            stem: base.stem(),
            title: base.title,
            base: base.rel_path,
            markdown: None,
            summary: summary.map(|s| s.rel_path),
            description,
            pages: None,
            author: None,
        }
    }

    fn from_pdf(
        base: DocumentNode,
        markdown: Option<DocumentNode>,
        summary: Option<DocumentNode>,
        metadata: Option<PdfMetadata>,
    ) -> Self {
        let heading_title = markdown
            .as_ref()
            .filter(|md| md.title_source != TitleSource::Filename)
            .map(|md| md.title.clone());
        let title = heading_title
            .or_else(|| metadata.as_ref().and_then(|m| m.title.clone()))
            .unwrap_or_else(|| base.title.clone());
        let metadata = metadata.unwrap_or_default();
        let description = markdown
            .iter()
            .chain(summary.iter())
            .find_map(|n| n.description.clone())
            .or(metadata.subject);

        Self {
            stem: base.stem(),
            base: base.rel_path,
            title,
            markdown: markdown.map(|n| n.rel_path),
            summary: summary.map(|n| n.rel_path),
            description,
            pages: metadata.pages,
            author: metadata.author,
        }
    }
}

/// Entries of one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGroup {
    /// Folder relative to the root with `/` separators; `""` is the root.
    pub folder: String,
    pub entries: Vec<IndexEntry>,
}

impl IndexGroup {
    /// Heading text: the folder, or `.` for the root.
    pub fn heading(&self) -> &str {
        if self.folder.is_empty() {
            "."
        } else {
            &self.folder
        }
    }
}

/// Pair siblings and group entries by folder.
///
/// `x.pdf` is the base of stem `x` when present, otherwise `x.md`.
/// `x-summary.md` attaches to the first base of its stem and becomes its
/// own entry when there is none. Stems match case-insensitively; bases that
/// differ only by case stay separate entries and siblings attach to the
/// first of them.
///
/// Groups are ordered by folder; entries by lowercased file name, then by
/// file name. With an `inspector`, PDF bases get their metadata title,
/// subject, author and page count.
#[must_use]
pub fn build_groups(
    nodes: Vec<DocumentNode>,
    inspector: Option<&dyn PdfInspector>,
) -> Vec<IndexGroup> {
    let mut metadata = MetadataReader { inspector };

    let mut folders: BTreeMap<String, BTreeMap<String, Vec<DocumentNode>>> = BTreeMap::new();
    for node in nodes {
        if node.kind == DocKind::Unknown {
            continue;
        }
        folders
            .entry(slash_path(node.folder()))
            .or_default()
            .entry(node.sibling_key())
            .or_default()
            .push(node);
    }

    folders
        .into_iter()
        .map(|(folder, stems)| {
            let mut entries: Vec<IndexEntry> = stems
                .into_values()
                .flat_map(|siblings| pair_siblings(siblings, &mut metadata))
                .collect();
            entries.sort_by_cached_key(|e| {
                let name = e.file_name();
                (name.to_lowercase(), name)
            });
            IndexGroup { folder, entries }
        })
        .collect()
}

/// Turn the files sharing one stem into entries.
fn pair_siblings(mut nodes: Vec<DocumentNode>, metadata: &mut MetadataReader<'_>) -> Vec<IndexEntry> {
    nodes.sort_by_cached_key(|n| {
        let name = n.file_name();
        (name.to_lowercase(), name)
    });

    let (pdfs, rest): (Vec<_>, Vec<_>) = nodes.into_iter().partition(|n| n.kind == DocKind::Pdf);
    let (summaries, markdown): (Vec<_>, Vec<_>) = rest
        .into_iter()
        .partition(|n| n.kind == DocKind::SummaryMarkdown);
    let mut markdown = markdown.into_iter();
    let mut summaries = summaries.into_iter();
    let mut summary = summaries.next();

    let mut entries = Vec::new();
    if pdfs.is_empty() {
        for md in markdown.by_ref() {
            entries.push(IndexEntry::from_markdown(md, summary.take()));
        }
    } else {
        let mut sibling = markdown.next();
        for pdf in pdfs {
            let meta = metadata.read(&pdf.path);
            entries.push(IndexEntry::from_pdf(pdf, sibling.take(), summary.take(), meta));
        }
    }
    entries.extend(markdown.map(|md| IndexEntry::from_markdown(md, None)));
    entries.extend(
        summary
            .into_iter()
            .chain(summaries)
            .map(|s| IndexEntry::from_markdown(s, None)),
    );
    entries
}

/// Reads PDF metadata, turning itself off when the tool is missing.
struct MetadataReader<'a> {
    inspector: Option<&'a dyn PdfInspector>,
}

impl MetadataReader<'_> {
    fn read(&mut self, path: &Path) -> Option<PdfMetadata> {
        let inspector = self.inspector?;
        match inspector.inspect(path) {
            Ok(metadata) => Some(metadata),
            Err(e @ PdfError::NotInstalled { .. }) => {
                tracing::warn!(error = %e, "PDF metadata disabled");
                self.inspector = None;
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read PDF metadata");
                None
            }
        }
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
