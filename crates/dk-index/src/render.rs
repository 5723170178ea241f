//! Markdown rendering of index groups.

use std::fmt::Write;
use std::path::{Component, Path};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::entry::{IndexEntry, IndexGroup};

/// Characters that would end or confuse a markdown link destination.
const LINK_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'(')
    .add(b')')
    .add(b'<')
    .add(b'>')
    .add(b'%')
    .add(b'#');

/// Render `groups` as the index document.
///
/// Entry paths are relative to `root`; links are written relative to
/// `index_dir`, the directory the index file lives in. No groups render to
/// an empty string.
pub fn render(groups: &[IndexGroup], root: &Path, index_dir: &Path) -> String {
    if groups.iter().all(|g| g.entries.is_empty()) {
        return String::new();
    }

    let mut out = String::from("# Documentation Index\n");
    for group in groups.iter().filter(|g| !g.entries.is_empty()) {
        let _ = write!(out, "\n## {}\n\n", group.heading());
        for entry in &group.entries {
            render_entry(&mut out, entry, root, index_dir);
        }
    }
    out
}

fn render_entry(out: &mut String, entry: &IndexEntry, root: &Path, index_dir: &Path) {
    let link = |rel: &Path| relative_link(index_dir, &root.join(rel));

    let _ = write!(out, "- [{}]({})", escape_text(&entry.title), link(&entry.base));
    if let Some(markdown) = &entry.markdown {
        let _ = write!(out, " ([markdown]({}))", link(markdown));
    }
    if let Some(summary) = &entry.summary {
        let _ = write!(out, " ([summary]({}))", link(summary));
    }
    match entry.pages {
        Some(1) => out.push_str(" (1 page)"),
        Some(pages) => {
            let _ = write!(out, " ({pages} pages)");
        }
        None => {}
    }
    if let Some(author) = &entry.author {
        let _ = write!(out, " (by {})", escape_text(author));
    }
    if let Some(description) = &entry.description {
        let _ = write!(out, " - {description}");
    }
    out.push('\n');
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Link from directory `from_dir` to `target`, both absolute.
///
/// Segments are joined with `/` and percent-encoded.
///
/// ```
/// use std::path::Path;
/// use dk_index::relative_link;
///
/// assert_eq!(relative_link(Path::new("/docs"), Path::new("/docs/a/my file.md")), "a/my%20file.md");
/// assert_eq!(relative_link(Path::new("/docs/meta"), Path::new("/docs/x (1).pdf")), "../x%20%281%29.pdf");
/// ```
pub fn relative_link(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let ups = std::iter::repeat_n("..".to_owned(), from.len() - common);
    let downs = to[common..].iter().map(|c| {
        utf8_percent_encode(&c.as_os_str().to_string_lossy(), LINK_SEGMENT).to_string()
    });
    ups.chain(downs).collect::<Vec<_>>().join("/")
}
