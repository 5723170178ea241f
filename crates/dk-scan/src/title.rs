//! Title derivation for documentation files.
//!
//! Markdown titles resolve as frontmatter `title` > first H1 heading >
//! humanized filename. Headings inside fenced code blocks or the frontmatter
//! block never count. Descriptions come from frontmatter `description`, or
//! else from the first prose line of the body.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::document::TitleSource;
use crate::markdown::{FenceTracker, split_frontmatter};

/// ATX level-1 heading, with optional closing hashes.
static H1_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}#[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap());

/// Setext level-1 underline.
static SETEXT_H1_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}=+[ \t]*$").unwrap());

/// Setext underline of any level.
static SETEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}(?:=+|-+)[ \t]*$").unwrap());

/// Prose lines this short are labels, not descriptions.
const MIN_DESCRIPTION_CHARS: usize = 21;

/// Longer prose descriptions are cut and marked with `...`.
const MAX_DESCRIPTION_CHARS: usize = 200;

/// Fields read from a markdown frontmatter block.
///
/// Uses `serde_yaml` so quoted strings and block scalars are handled;
/// unknown keys are ignored.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Frontmatter {
    /// Explicit document title.
    pub title: Option<String>,
    /// Short description shown next to the index entry.
    pub description: Option<String>,
}

impl Frontmatter {
    /// Parse the frontmatter of `content`, if it has a valid one.
    pub fn parse(content: &str) -> Option<Self> {
        let (yaml, _) = split_frontmatter(content);
        let yaml = yaml?.trim();
        if yaml.is_empty() {
            return None;
        }
        match serde_yaml::from_str(yaml) {
            Ok(frontmatter) => Some(frontmatter),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid frontmatter");
                None
            }
        }
    }
}

/// Title and description derived for one markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTitle {
    /// Resolved display title.
    pub title: String,
    /// Where the title came from.
    pub source: TitleSource,
    /// Frontmatter description, else the first prose line.
    pub description: Option<String>,
}

impl DerivedTitle {
    /// Derive title and description from markdown `content`.
    ///
    /// `file_name` is the fallback when neither frontmatter nor a heading
    /// provides a title.
    pub fn from_markdown(content: &str, file_name: &str) -> Self {
        let frontmatter = Frontmatter::parse(content).unwrap_or_default();
        let description = frontmatter
            .description
            .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|d| !d.is_empty())
            .or_else(|| first_paragraph(content));

        if let Some(title) = frontmatter.title.filter(|t| !t.trim().is_empty()) {
            return Self {
                title: title.trim().to_owned(),
                source: TitleSource::Frontmatter,
                description,
            };
        }

        match first_heading(content) {
            Some(title) => Self {
                title,
                source: TitleSource::Heading,
                description,
            },
            None => Self {
                title: title_from_filename(file_name),
                source: TitleSource::Filename,
                description,
            },
        }
    }

    /// Title derived from the filename alone.
    pub fn from_filename(file_name: &str) -> Self {
        Self {
            title: title_from_filename(file_name),
            source: TitleSource::Filename,
            description: None,
        }
    }
}

/// Extract the first level-1 heading outside code blocks and frontmatter.
pub(crate) fn first_heading(content: &str) -> Option<String> {
    let (_, body) = split_frontmatter(content);
    let mut fences = FenceTracker::new();
    let mut previous: Option<&str> = None;

    for line in body.lines() {
        if fences.is_code(line) {
            previous = None;
            continue;
        }
        if let Some(caps) = H1_REGEX.captures(line) {
            return Some(caps[1].trim().to_owned());
        }
        if SETEXT_H1_REGEX.is_match(line)
            && let Some(text) = previous
        {
            return Some(text.trim().to_owned());
        }
        previous = Some(line).filter(|l| !l.trim().is_empty());
    }

    None
}

/// First body line that reads like prose, for use as a description.
///
/// Headings, setext underlines, fenced code and lines of 20 characters or
/// fewer are skipped. The line is cut to 200 characters.
pub(crate) fn first_paragraph(content: &str) -> Option<String> {
    let (_, body) = split_frontmatter(content);
    let mut fences = FenceTracker::new();
    let mut lines = body.lines().peekable();

    while let Some(line) = lines.next() {
        if fences.is_code(line) {
            continue;
        }
        let text = line.trim();
        let underlined = lines.peek().is_some_and(|next| SETEXT_REGEX.is_match(next));
        if text.starts_with('#') || underlined || SETEXT_REGEX.is_match(line) {
            continue;
        }
        let chars = text.chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            continue;
        }
        if chars > MAX_DESCRIPTION_CHARS {
            let cut: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
            return Some(format!("{cut}..."));
        }
        return Some(text.to_owned());
    }

    None
}

/// Generate a display title from a filename.
///
/// Drops the extension, turns `-` and `_` into spaces and title-cases each
/// word.
///
/// # Examples
///
/// ```
/// use dk_scan::title_from_filename;
///
/// assert_eq!(title_from_filename("setup-guide.md"), "Setup Guide");
/// assert_eq!(title_from_filename("API_reference.pdf"), "Api Reference");
/// ```
pub fn title_from_filename(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let mut result = String::with_capacity(stem.len());
    for word in stem.split(['-', '_', ' ']).filter(|w| !w.is_empty()) {
        if !result.is_empty() {
            result.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(&chars.as_str().to_lowercase());
        }
    }
    result
}
