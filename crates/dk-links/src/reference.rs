use std::path::PathBuf;

use crate::parser::{LinkSyntax, RawLink};
use crate::target::{Anchor, LinkKind, parse_target};

/// A link found in a documentation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    /// Source file, relative to the documentation root.
    pub source: PathBuf,
    /// 1-based line.
    pub line: usize,
    /// 1-based character column.
    pub column: usize,
    /// Link text as written.
    pub text: String,
    /// Raw target string.
    pub target: String,
    /// Anchor of a well-formed target.
    pub anchor: Option<Anchor>,
    pub syntax: LinkSyntax,
    pub kind: LinkKind,
}

impl LinkReference {
    /// Build a reference from a parsed link in `source`.
    pub fn new(source: PathBuf, raw: RawLink) -> Self {
        let kind = LinkKind::classify(&raw.target);
        let anchor = parse_target(&raw.target).ok().and_then(|t| t.anchor);
        Self {
            source,
            line: raw.line,
            column: raw.column,
            text: raw.text,
            target: raw.target,
            anchor,
            syntax: raw.syntax,
            kind,
        }
    }

    /// `path:line:column` with `/` separators.
    pub fn location(&self) -> String {
        let source: Vec<_> = self
            .source
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        format!("{}:{}:{}", source.join("/"), self.line, self.column)
    }

    /// Returns `true` if the target names a `.pdf`, ignoring anchor and query.
    pub fn targets_pdf(&self) -> bool {
        let path = self.target.split(['#', '?']).next().unwrap_or_default();
        path.to_ascii_lowercase().ends_with(".pdf")
    }
}
