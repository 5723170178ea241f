//! Link targets: classification, anchors and decoding.

use std::fmt;

use percent_encoding::percent_decode_str;

/// What a link target points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Path resolved against the source file's directory.
    RelativeFile,
    /// `/path` resolved against the documentation root.
    AbsoluteFile,
    /// URL with a scheme, or protocol-relative `//host/...`.
    ExternalUrl,
    /// `#fragment` within the same document.
    PageAnchor,
}

impl LinkKind {
    /// Classify a raw target without validating it.
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if is_external(raw) {
            Self::ExternalUrl
        } else if raw.starts_with('#') {
            Self::PageAnchor
        } else if raw.starts_with('/') {
            Self::AbsoluteFile
        } else {
            Self::RelativeFile
        }
    }
}

/// Anchor split off a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// PDF open parameter `#page=N`.
    Page(u32),
    /// Any other fragment.
    Fragment(String),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "page={page}"),
            Self::Fragment(fragment) => f.write_str(fragment),
        }
    }
}

/// Why a target is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Empty or whitespace-only target.
    Empty,
    /// Target contains a control character.
    ControlCharacter,
    /// Link syntax opened but not closed on its line.
    Unterminated,
    /// `#page=` value is not a positive integer.
    InvalidPage(String),
    /// Percent-encoded bytes are not UTF-8.
    InvalidEncoding,
    /// Target PDF exists but `pdfinfo` rejected it.
    UnreadablePdf(String),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty target"),
            Self::ControlCharacter => f.write_str("control character in target"),
            Self::Unterminated => f.write_str("unterminated link"),
            Self::InvalidPage(value) => write!(f, "invalid page number '{value}'"),
            Self::InvalidEncoding => f.write_str("invalid percent-encoding"),
            Self::UnreadablePdf(message) => write!(f, "unreadable PDF: {message}"),
        }
    }
}

/// A validated, decoded target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Classification.
    pub kind: LinkKind,
    /// Decoded path without anchor or query. The full URL for external
    /// targets, empty for page anchors.
    pub path: String,
    /// Anchor, if any.
    pub anchor: Option<Anchor>,
}

impl Target {
    /// Returns `true` if the path names a PDF file.
    pub fn is_pdf(&self) -> bool {
        self.kind != LinkKind::ExternalUrl && self.path.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Returns `true` if `target` starts with a URL scheme or `//`.
///
/// A scheme is a letter followed by letters, digits, `+`, `-` or `.`, at
/// least two characters long, so `C:/docs` stays a path.
///
/// ```
/// use dk_links::is_external;
///
/// assert!(is_external("https://example.com"));
/// assert!(is_external("mailto:docs@example.com"));
/// assert!(!is_external("C:/docs/a.md"));
/// assert!(!is_external("guide.md"));
/// ```
pub fn is_external(target: &str) -> bool {
    if target.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    scheme.len() >= 2
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Validate and decode a raw target.
///
/// The anchor (`#...`) and query (`?...`) are split off, then the path is
/// percent-decoded (`my%20file.md` names `my file.md`).
///
/// # Errors
///
/// Returns the [`MalformedReason`] if the target is empty, contains control
/// characters, carries an invalid `#page=` value or decodes to invalid UTF-8.
pub fn parse_target(raw: &str) -> Result<Target, MalformedReason> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MalformedReason::Empty);
    }
    if raw.chars().any(char::is_control) {
        return Err(MalformedReason::ControlCharacter);
    }
    if is_external(raw) {
        return Ok(Target {
            kind: LinkKind::ExternalUrl,
            path: raw.to_owned(),
            anchor: None,
        });
    }

    let (path, anchor) = match raw.split_once('#') {
        Some((path, fragment)) => (path, Some(parse_anchor(fragment)?)),
        None => (raw, None),
    };
    let path = path.split_once('?').map_or(path, |(path, _)| path);

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| MalformedReason::InvalidEncoding)?;
    if decoded.chars().any(char::is_control) {
        return Err(MalformedReason::ControlCharacter);
    }

    let kind = if decoded.is_empty() {
        if anchor.is_none() {
            return Err(MalformedReason::Empty);
        }
        LinkKind::PageAnchor
    } else if decoded.starts_with('/') {
        LinkKind::AbsoluteFile
    } else {
        LinkKind::RelativeFile
    };

    Ok(Target {
        kind,
        path: decoded.into_owned(),
        anchor,
    })
}

/// Parse a fragment; `page=` may be combined with other open parameters
/// (`page=3&zoom=100`).
fn parse_anchor(fragment: &str) -> Result<Anchor, MalformedReason> {
    let page = fragment
        .split('&')
        .find_map(|param| param.strip_prefix("page="));
    match page {
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .map(Anchor::Page)
            .ok_or_else(|| MalformedReason::InvalidPage(value.to_owned())),
        None => Ok(Anchor::Fragment(fragment.to_owned())),
    }
}
