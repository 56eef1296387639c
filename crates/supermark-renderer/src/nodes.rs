//! Rendered document tree.
//!
//! The tree is recomputed from scratch for every revision of the source text,
//! so nothing here carries identity or mutable state.

use serde::Serialize;

/// Inline content within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Inline {
    /// Literal text. Escaped on output.
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    /// Inline code span, verbatim.
    Code(String),
    Link {
        href: String,
        content: Vec<Inline>,
    },
    /// Image reference. `src` is kept exactly as written, data URLs included.
    Image { alt: String, src: String },
    /// Line break inside a paragraph.
    SoftBreak,
}

/// One bullet list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem(pub Vec<Inline>);

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph { content: Vec<Inline> },
    List { items: Vec<ListItem> },
    CodeBlock { lang: Option<String>, code: String },
}

/// Output of a single render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    pub blocks: Vec<Block>,
}

impl RenderedOutput {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serialize to an HTML fragment, one block per line.
    pub fn to_html(&self) -> String {
        crate::html::push_html(self)
    }
}
