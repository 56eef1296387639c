//! supermark-renderer: markdown to sanitized HTML for the SuperMark editor.
//!
//! Rendering is a pure function of the source text. It never fails: input it
//! cannot interpret is kept as escaped literal text.
//!
//! - [`block`] classifies lines and groups them into blocks
//! - [`inline`] scans emphasis, code spans, links and images
//! - [`html`] serializes the tree
//! - [`page`] writes and reads self-contained snapshot pages

pub mod block;
pub mod html;
pub mod inline;
pub mod nodes;
pub mod page;

pub use nodes::{Block, Inline, ListItem, RenderedOutput};
pub use page::{
    DRAG_OVER_CLASS, INPUT_ID, PREVIEW_ID, PRODUCT_NAME, export_snapshot, import_snapshot,
};

/// Parse markdown into a rendered tree.
pub fn render(text: &str) -> RenderedOutput {
    RenderedOutput::new(block::scan_blocks(text))
}

/// Parse markdown and serialize straight to HTML.
pub fn render_html(text: &str) -> String {
    render(text).to_html()
}
