//! Block scanner.
//!
//! A line classification pass followed by grouping. Each line maps to exactly
//! one [`LineKind`]; adjacent lines of the same kind are merged into one block.
//! Inline content of each block is handed to [`crate::inline`].

use crate::inline::parse_inlines;
use crate::nodes::{Block, ListItem};

/// Deepest heading level. More leading `#` than this is paragraph text.
pub const MAX_HEADING_LEVEL: usize = 6;

/// Minimum number of backticks opening a fenced code block.
const FENCE_MIN: usize = 3;

/// Indentation beyond this turns a would-be marker into plain text.
const MAX_MARKER_INDENT: usize = 3;

/// Classification of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    Bullet { text: &'a str },
    Fence { ticks: usize, info: &'a str },
    Text(&'a str),
}

/// Classify a line outside of a code fence.
///
/// Precedence is fence opener, then heading, then bullet, then text.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    let Some(body) = strip_marker_indent(line) else {
        return LineKind::Text(line.trim());
    };
    if let Some((ticks, info)) = fence_opener(body) {
        return LineKind::Fence { ticks, info };
    }
    if let Some((level, text)) = heading(body) {
        return LineKind::Heading { level, text };
    }
    if let Some(text) = bullet(body) {
        return LineKind::Bullet { text };
    }
    LineKind::Text(body.trim())
}

fn strip_marker_indent(line: &str) -> Option<&str> {
    let body = line.trim_start_matches(' ');
    (line.len() - body.len() <= MAX_MARKER_INDENT).then_some(body)
}

fn fence_opener(body: &str) -> Option<(usize, &str)> {
    let ticks = body.len() - body.trim_start_matches('`').len();
    if ticks < FENCE_MIN {
        return None;
    }
    let info = body[ticks..].trim();
    // Backticks in the info string would make this an inline code span.
    if info.contains('`') {
        return None;
    }
    Some((ticks, info))
}

fn is_fence_close(line: &str, open_ticks: usize) -> bool {
    let Some(body) = strip_marker_indent(line) else {
        return false;
    };
    let ticks = body.len() - body.trim_start_matches('`').len();
    ticks >= open_ticks && body[ticks..].trim().is_empty()
}

fn heading(body: &str) -> Option<(u8, &str)> {
    let hashes = body.len() - body.trim_start_matches('#').len();
    if hashes == 0 || hashes > MAX_HEADING_LEVEL {
        return None;
    }
    let rest = &body[hashes..];
    if rest.is_empty() {
        return Some((hashes as u8, ""));
    }
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((hashes as u8, strip_closing_hashes(rest.trim())))
}

/// `## Title ##` keeps only `Title`; `C#` is left alone.
fn strip_closing_hashes(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.is_empty() {
        ""
    } else if without.len() == text.len() {
        text
    } else if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        text
    }
}

fn bullet(body: &str) -> Option<&str> {
    let mut chars = body.chars();
    let marker = chars.next()?;
    if !matches!(marker, '-' | '*' | '+') {
        return None;
    }
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some("");
    }
    rest.starts_with([' ', '\t']).then(|| rest.trim())
}

struct OpenFence<'a> {
    ticks: usize,
    lang: Option<&'a str>,
    lines: Vec<&'a str>,
}

/// Groups classified lines into blocks.
#[derive(Default)]
struct BlockScanner<'a> {
    blocks: Vec<Block>,
    paragraph: Vec<&'a str>,
    list: Vec<&'a str>,
    fence: Option<OpenFence<'a>>,
}

impl<'a> BlockScanner<'a> {
    fn push_line(&mut self, line: &'a str) {
        if let Some(fence) = self.fence.as_mut() {
            if is_fence_close(line, fence.ticks) {
                self.close_fence();
            } else {
                fence.lines.push(line);
            }
            return;
        }

        match classify_line(line) {
            LineKind::Blank => self.flush(),
            LineKind::Fence { ticks, info } => {
                self.flush();
                self.fence = Some(OpenFence {
                    ticks,
                    lang: info.split_whitespace().next(),
                    lines: Vec::new(),
                });
            }
            LineKind::Heading { level, text } => {
                self.flush();
                self.blocks.push(Block::Heading {
                    level,
                    content: parse_inlines(text),
                });
            }
            LineKind::Bullet { text } => {
                self.flush_paragraph();
                self.list.push(text);
            }
            LineKind::Text(text) => {
                self.flush_list();
                self.paragraph.push(text);
            }
        }
    }

    fn close_fence(&mut self) {
        let Some(fence) = self.fence.take() else {
            return;
        };
        let mut code = fence.lines.join("\n");
        if !fence.lines.is_empty() {
            code.push('\n');
        }
        self.blocks.push(Block::CodeBlock {
            lang: fence.lang.map(str::to_owned),
            code,
        });
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let joined = self.paragraph.join("\n");
        self.paragraph.clear();
        self.blocks.push(Block::Paragraph {
            content: parse_inlines(&joined),
        });
    }

    fn flush_list(&mut self) {
        if self.list.is_empty() {
            return;
        }
        let items = self
            .list
            .drain(..)
            .map(|text| ListItem(parse_inlines(text)))
            .collect();
        self.blocks.push(Block::List { items });
    }

    fn flush(&mut self) {
        self.flush_paragraph();
        self.flush_list();
    }

    fn finish(mut self) -> Vec<Block> {
        // An unterminated fence runs to the end of input.
        self.close_fence();
        self.flush();
        self.blocks
    }
}

/// Split markdown source into blocks.
pub fn scan_blocks(text: &str) -> Vec<Block> {
    let mut scanner = BlockScanner::default();
    for line in text.lines() {
        scanner.push_line(line);
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Inline;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_classify_heading_levels() {
        for level in 1..=6u8 {
            let line = format!("{} X", "#".repeat(level as usize));
            assert_eq!(
                classify_line(&line),
                LineKind::Heading { level, text: "X" }
            );
        }
    }

    #[test]
    fn test_classify_seven_hashes_is_text() {
        assert_eq!(classify_line("####### X"), LineKind::Text("####### X"));
    }

    #[test]
    fn test_classify_hash_without_space_is_text() {
        assert_eq!(classify_line("#hashtag"), LineKind::Text("#hashtag"));
    }

    #[test]
    fn test_classify_closing_hashes() {
        assert_eq!(
            classify_line("## Title ##"),
            LineKind::Heading {
                level: 2,
                text: "Title"
            }
        );
        assert_eq!(
            classify_line("# C#"),
            LineKind::Heading {
                level: 1,
                text: "C#"
            }
        );
    }

    #[test]
    fn test_classify_bullets() {
        for marker in ["-", "*", "+"] {
            let line = format!("{marker} item");
            assert_eq!(classify_line(&line), LineKind::Bullet { text: "item" });
        }
        // Strong at line start is not a bullet.
        assert_eq!(classify_line("**bold**"), LineKind::Text("**bold**"));
    }

    #[test]
    fn test_classify_fence() {
        assert_eq!(
            classify_line("```javascript"),
            LineKind::Fence {
                ticks: 3,
                info: "javascript"
            }
        );
        assert_eq!(classify_line("``not fence"), LineKind::Text("``not fence"));
    }

    #[test]
    fn test_deep_indent_is_text() {
        assert_eq!(classify_line("    # x"), LineKind::Text("# x"));
    }

    #[test]
    fn test_paragraph_lines_merge() {
        let blocks = scan_blocks("one\ntwo\n\nthree");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    content: vec![text("one"), Inline::SoftBreak, text("two")]
                },
                Block::Paragraph {
                    content: vec![text("three")]
                },
            ]
        );
    }

    #[test]
    fn test_list_after_heading() {
        let blocks = scan_blocks("## Shopping List\n- Item 1\n- Item 2\n- Item 3");
        assert_eq!(blocks.len(), 2);
        match &blocks[1] {
            Block::List { items } => {
                let labels: Vec<_> = items.iter().map(|i| i.0.clone()).collect();
                assert_eq!(
                    labels,
                    vec![
                        vec![text("Item 1")],
                        vec![text("Item 2")],
                        vec![text("Item 3")]
                    ]
                );
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_text_line_ends_list() {
        let blocks = scan_blocks("- a\n- b\nafter");
        assert!(matches!(&blocks[0], Block::List { items } if items.len() == 2));
        assert!(matches!(&blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn test_fence_content_is_verbatim() {
        let blocks = scan_blocks("```rust\nlet **x** = [a](b);\n\n# not heading\n```\nafter");
        assert_eq!(
            blocks[0],
            Block::CodeBlock {
                lang: Some("rust".into()),
                code: "let **x** = [a](b);\n\n# not heading\n".into(),
            }
        );
        assert_eq!(
            blocks[1],
            Block::Paragraph {
                content: vec![text("after")]
            }
        );
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let blocks = scan_blocks("```\ncode\n- still code");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                lang: None,
                code: "code\n- still code\n".into()
            }]
        );
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let blocks = scan_blocks("````\n```\n````");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                lang: None,
                code: "```\n".into()
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(scan_blocks("").is_empty());
        assert!(scan_blocks("\n\n   \n").is_empty());
    }
}
