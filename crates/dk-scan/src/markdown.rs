//! Line-level markdown structure shared by title extraction and link parsing.

/// Split a leading YAML frontmatter block from markdown content.
///
/// The block must start on the first line with `---` and end with a line
/// containing only `---` or `...`. Returns the YAML text (without delimiters)
/// and the remaining body. Content without a closed block is returned whole.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare == "---" || bare == "..." {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, content)
}

/// Tracks fenced code blocks while iterating over lines.
///
/// Feed every line in order to [`FenceTracker::is_code`]; fence delimiter
/// lines and everything between them count as code.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Create a tracker positioned outside any fence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `line` belongs to a fenced code block.
    pub fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        let marker = if line.len() - trimmed.len() <= 3 {
            fence_marker(trimmed)
        } else {
            None
        };

        match (self.open, marker) {
            (None, Some((ch, len))) => {
                self.open = Some((ch, len));
                true
            }
            (Some((open_ch, open_len)), Some((ch, len))) => {
                // Closing fences carry no info string.
                if ch == open_ch && len >= open_len && trimmed[len..].trim().is_empty() {
                    self.open = None;
                }
                true
            }
            (Some(_), None) => true,
            (None, None) => false,
        }
    }
}

/// Fence character and run length if `line` starts with a code fence.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let ch = line.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = line.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frontmatter() {
        let content = "---\ntitle: Guide\n---\n# Heading\n";
        let (yaml, body) = split_frontmatter(content);
        assert_eq!(yaml, Some("title: Guide\n"));
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn test_split_frontmatter_dots_terminator() {
        let (yaml, body) = split_frontmatter("---\r\ntitle: X\r\n...\r\nbody");
        assert_eq!(yaml, Some("title: X\r\n"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_split_frontmatter_unclosed() {
        let content = "---\ntitle: Guide\n# Heading\n";
        assert_eq!(split_frontmatter(content), (None, content));
    }

    #[test]
    fn test_split_frontmatter_absent() {
        let content = "# Heading\n---\n";
        assert_eq!(split_frontmatter(content), (None, content));
    }

    #[test]
    fn test_fence_tracker_backticks() {
        let mut fences = FenceTracker::new();
        let flags: Vec<bool> = ["text", "```bash", "# comment", "```", "after"]
            .iter()
            .map(|l| fences.is_code(l))
            .collect();
        assert_eq!(flags, vec![false, true, true, true, false]);
    }

    #[test]
    fn test_fence_tracker_requires_matching_close() {
        let mut fences = FenceTracker::new();
        assert!(fences.is_code("~~~~"));
        assert!(fences.is_code("```"));
        assert!(fences.is_code("~~~"));
        assert!(fences.is_code("~~~~~"));
        assert!(!fences.is_code("prose"));
    }

    #[test]
    fn test_fence_tracker_ignores_deep_indent() {
        let mut fences = FenceTracker::new();
        assert!(!fences.is_code("    ```"));
        assert!(!fences.is_code("text"));
    }
}
