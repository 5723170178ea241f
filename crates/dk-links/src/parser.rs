//! Link extraction from markdown source.
//!
//! Inline links and images are read with a small hand-written scanner that
//! follows this grammar on a single line:
//!
//! ```text
//! link   := '!'? '[' text ']' '(' ws? target (ws title)? ws? ')'
//! text   := balanced '[' ']' pairs, '\' escapes, code spans are opaque
//! target := '<' ... '>' | run without whitespace, balanced or '\'-escaped parens
//! title  := '"' ... '"' | '\'' ... '\'' | '(' ... ')'
//! ```
//!
//! Reference definitions, HTML anchors and bare paths are simple line forms
//! matched with regular expressions. Frontmatter, fenced code blocks and
//! inline code spans never produce links.

use std::ops::Range;
use std::sync::LazyLock;

use dk_scan::markdown::{FenceTracker, split_frontmatter};
use regex::Regex;

/// `[label]: target`, with an optional `<...>` target.
static REFERENCE_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}\[((?:[^\]\\]|\\.)+)\]:[ \t]*(?:<([^>]*)>|(\S+))").unwrap()
});

static HTML_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Path-like token ending in a documentation extension.
static BARE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:\.{1,2}/)+|/)?[A-Za-z0-9_][A-Za-z0-9_\-./]*\.(?i:md|pdf)\b").unwrap()
});

/// How a link was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkSyntax {
    /// `[text](target)`.
    Inline,
    /// `![alt](target)`.
    Image,
    /// `[label]: target` definition.
    Reference,
    /// `<a href="target">`.
    Html,
    /// A path mentioned in prose, outside any link.
    Bare,
}

/// A link occurrence before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// Syntax the link was written in.
    pub syntax: LinkSyntax,
    /// Link text, image alt text or reference label. Empty for HTML and bare links.
    pub text: String,
    /// Target with markdown escapes removed.
    pub target: String,
    /// 1-based line number in the file.
    pub line: usize,
    /// 1-based character column of the link start.
    pub column: usize,
    /// `false` if the link syntax was opened but never closed.
    pub terminated: bool,
}

/// Extract every link from markdown `content`.
///
/// Links are returned in source order. Line numbers count from the start of
/// `content`, frontmatter included.
pub fn parse_links(content: &str, bare_paths: bool) -> Vec<RawLink> {
    let (_, body) = split_frontmatter(content);
    let line_offset = content[..content.len() - body.len()].matches('\n').count();

    let mut fences = FenceTracker::new();
    let mut links = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        if fences.is_code(line) {
            continue;
        }
        parse_line(line, line_offset + idx + 1, bare_paths, &mut links);
    }
    links
}

/// Link found on a line, positioned by byte offsets.
struct Found {
    syntax: LinkSyntax,
    text: String,
    target: String,
    span: Range<usize>,
    terminated: bool,
}

fn parse_line(line: &str, line_no: usize, bare_paths: bool, links: &mut Vec<RawLink>) {
    let mut found = Vec::new();

    if let Some(definition) = reference_definition(line) {
        found.push(definition);
    } else {
        let code = code_spans(line);
        scan_inline(line, 0..line.len(), &code, &mut found);
        scan_html(line, &code, &mut found);
        if bare_paths {
            scan_bare(line, &code, &mut found);
        }
    }

    found.sort_by_key(|f| f.span.start);
    links.extend(found.into_iter().map(|f| RawLink {
        syntax: f.syntax,
        column: line[..f.span.start].chars().count() + 1,
        text: f.text,
        target: f.target,
        line: line_no,
        terminated: f.terminated,
    }));
}

fn reference_definition(line: &str) -> Option<Found> {
    let caps = REFERENCE_DEF_RE.captures(line)?;
    let label = caps.get(1)?;
    // Footnote definitions share the syntax.
    if label.as_str().starts_with('^') {
        return None;
    }
    let target = caps.get(2).or_else(|| caps.get(3))?;
    Some(Found {
        syntax: LinkSyntax::Reference,
        text: label.as_str().to_owned(),
        target: unescape(target.as_str()),
        span: label.start() - 1..line.len(),
        terminated: true,
    })
}

/// Byte ranges of inline code spans, backtick delimiters included.
fn code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let run_at = |from: usize| bytes[from..].iter().take_while(|&&b| b == b'`').count();

    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let run = run_at(i);
                let mut j = i + run;
                let mut close = None;
                while j < bytes.len() {
                    if bytes[j] == b'`' {
                        let other = run_at(j);
                        if other == run {
                            close = Some(j + other);
                            break;
                        }
                        j += other;
                    } else {
                        j += 1;
                    }
                }
                match close {
                    Some(end) => {
                        spans.push(i..end);
                        i = end;
                    }
                    None => i += run,
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn span_at(ranges: &[Range<usize>], pos: usize) -> Option<&Range<usize>> {
    ranges.iter().find(|r| r.contains(&pos))
}

fn overlaps(found: &[Found], span: &Range<usize>) -> bool {
    found
        .iter()
        .any(|f| f.span.start < span.end && span.start < f.span.end)
}

fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    bytes[..pos].iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}

/// Find inline links and images in `range`, descending into link text.
fn scan_inline(line: &str, range: Range<usize>, code: &[Range<usize>], found: &mut Vec<Found>) {
    let bytes = line.as_bytes();
    let mut i = range.start;
    while i < range.end {
        if let Some(span) = span_at(code, i) {
            i = span.end;
            continue;
        }
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => {
                let Some(link) = inline_link_at(line, i, range.end, code) else {
                    i += 1;
                    continue;
                };
                let image = i > range.start && bytes[i - 1] == b'!' && !is_escaped(bytes, i - 1);
                let text = i + 1..link.text_end;
                found.push(Found {
                    syntax: if image {
                        LinkSyntax::Image
                    } else {
                        LinkSyntax::Inline
                    },
                    text: line[text.clone()].to_owned(),
                    target: link.target,
                    span: if image { i - 1 } else { i }..link.end,
                    terminated: link.terminated,
                });
                // `[![badge](badge.svg)](page.md)` holds two links.
                scan_inline(line, text, code, found);
                i = link.end;
            }
            _ => i += 1,
        }
    }
}

struct InlineLink {
    /// Offset of the `]` closing the link text.
    text_end: usize,
    target: String,
    /// Offset just past the link; end of line when unterminated.
    end: usize,
    terminated: bool,
}

/// Parse an inline link whose text opens at `open`.
///
/// Returns `None` when the brackets are not followed by `(`: such text is
/// not a link at all. A link whose destination is never closed is returned
/// with `terminated == false`.
fn inline_link_at(
    line: &str,
    open: usize,
    end: usize,
    code: &[Range<usize>],
) -> Option<InlineLink> {
    let bytes = line.as_bytes();

    let mut depth = 0usize;
    let mut i = open;
    let close = loop {
        if i >= end {
            return None;
        }
        if let Some(span) = span_at(code, i) {
            i = span.end;
            continue;
        }
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => {
                depth += 1;
                i += 1;
            }
            b']' => {
                depth -= 1;
                if depth == 0 {
                    break i;
                }
                i += 1;
            }
            _ => i += 1,
        }
    };

    if close + 1 >= end || bytes[close + 1] != b'(' {
        return None;
    }

    let unterminated = |target: String| InlineLink {
        text_end: close,
        target,
        end,
        terminated: false,
    };

    let mut i = skip_blanks(bytes, close + 2, end);
    let target = if i < end && bytes[i] == b'<' {
        let start = i + 1;
        i = start;
        while i < end && bytes[i] != b'>' {
            i += if bytes[i] == b'\\' { 2 } else { 1 };
        }
        if i >= end {
            return Some(unterminated(unescape(&line[start..end])));
        }
        let target = unescape(&line[start..i]);
        i += 1;
        target
    } else {
        let start = i;
        let mut parens = 0usize;
        while i < end {
            match bytes[i] {
                b'\\' if i + 1 < end && bytes[i + 1].is_ascii_punctuation() => i += 2,
                b'(' => {
                    parens += 1;
                    i += 1;
                }
                b')' if parens == 0 => break,
                b')' => {
                    parens -= 1;
                    i += 1;
                }
                b' ' | b'\t' => break,
                _ => i += 1,
            }
        }
        let target = unescape(&line[start..i]);
        if parens > 0 {
            return Some(unterminated(target));
        }
        target
    };

    i = skip_blanks(bytes, i, end);
    if i < end && matches!(bytes[i], b'"' | b'\'' | b'(') {
        let closer = if bytes[i] == b'(' { b')' } else { bytes[i] };
        i += 1;
        while i < end && bytes[i] != closer {
            i += if bytes[i] == b'\\' { 2 } else { 1 };
        }
        if i >= end {
            return Some(unterminated(target));
        }
        i = skip_blanks(bytes, i + 1, end);
    }

    if i < end && bytes[i] == b')' {
        Some(InlineLink {
            text_end: close,
            target,
            end: i + 1,
            terminated: true,
        })
    } else {
        Some(unterminated(target))
    }
}

fn skip_blanks(bytes: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    i
}

/// Remove backslash escapes in front of ASCII punctuation.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && next.is_ascii_punctuation()
        {
            out.push(next);
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

fn scan_html(line: &str, code: &[Range<usize>], found: &mut Vec<Found>) {
    let mut anchors = Vec::new();
    for caps in HTML_HREF_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let span = whole.range();
        if span_at(code, span.start).is_some() || overlaps(found, &span) {
            continue;
        }
        let target = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        anchors.push(Found {
            syntax: LinkSyntax::Html,
            text: String::new(),
            target: target.to_owned(),
            span,
            terminated: true,
        });
    }
    found.extend(anchors);
}

fn scan_bare(line: &str, code: &[Range<usize>], found: &mut Vec<Found>) {
    let mut paths = Vec::new();
    for m in BARE_PATH_RE.find_iter(line) {
        let span = m.range();
        if span_at(code, span.start).is_some() || overlaps(found, &span) {
            continue;
        }
        // Tails of URLs, emails and `key=value` pairs are not paths.
        if line[..span.start]
            .chars()
            .next_back()
            .is_some_and(|c| matches!(c, '/' | ':' | '@' | '=' | '~' | '%' | '#' | '?' | '&' | '+' | '\\' | '-' | '.'))
        {
            continue;
        }
        // `notes.md.bak`, `x.pdf-old`: the extension is not the end of the name.
        let mut after = line[span.end..].chars();
        match (after.next(), after.next()) {
            (Some('.'), Some(c)) if c.is_alphanumeric() => continue,
            (Some(c), _) if matches!(c, '-' | '/' | '_') || c.is_alphanumeric() => continue,
            _ => {}
        }
        let token = m.as_str();
        if token.contains("//") || looks_like_host(token) {
            continue;
        }
        paths.push(Found {
            syntax: LinkSyntax::Bare,
            text: String::new(),
            target: token.to_owned(),
            span,
            terminated: true,
        });
    }
    found.extend(paths);
}

/// `example.com/guide.md`: a dotted first segment followed by more path.
fn looks_like_host(token: &str) -> bool {
    let mut segments = token.split('/');
    let first = segments.next().unwrap_or_default();
    segments.next().is_some() && first != "." && first != ".." && first.contains('.')
}
