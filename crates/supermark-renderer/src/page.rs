//! Self-contained snapshot page.
//!
//! An exported page embeds the raw markdown in the editable input pane and the
//! rendered output in the preview pane. Reopening the page, in a browser or via
//! [`import_snapshot`], yields the exported text byte for byte.

use std::fmt::{self, Write as _};

use pulldown_cmark_escape::{FmtWriter, escape_html_body_text};

use crate::render;

/// Product name used for the document title and the page header.
pub const PRODUCT_NAME: &str = "SuperMark";

/// Stable id of the markdown input element.
pub const INPUT_ID: &str = "markdown-input";

/// Stable id of the rendered output element.
pub const PREVIEW_ID: &str = "preview";

/// CSS class set on the input pane while a file is dragged over it.
pub const DRAG_OVER_CLASS: &str = "drag-over";

const BASE_CSS: &str = "\
body { margin: 0; font-family: system-ui, sans-serif; }
header { padding: 0.5rem 1rem; border-bottom: 1px solid #ddd; }
main { display: flex; height: calc(100vh - 4rem); }
#markdown-input, #preview { flex: 1; padding: 1rem; overflow: auto; }
#markdown-input { font-family: ui-monospace, monospace; border: none; border-right: 1px solid #ddd; resize: none; }
#markdown-input.drag-over { outline: 2px dashed #4a90d9; }
#preview img { max-width: 100%; }
";

/// Build a standalone HTML page holding `text` and its rendered preview.
pub fn export_snapshot(text: &str) -> String {
    let mut page = String::new();
    if let Err(err) = write_snapshot(&mut page, text) {
        tracing::warn!(%err, "snapshot export stopped early");
    }
    page
}

fn write_snapshot(page: &mut String, text: &str) -> fmt::Result {
    writeln!(page, "<!DOCTYPE html>")?;
    writeln!(page, "<html lang=\"en\">")?;
    writeln!(page, "<head>")?;
    writeln!(page, "  <meta charset=\"utf-8\">")?;
    writeln!(
        page,
        "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    )?;
    writeln!(page, "  <title>{PRODUCT_NAME}</title>")?;
    writeln!(page, "  <style>\n{BASE_CSS}  </style>")?;
    writeln!(page, "</head>")?;
    writeln!(page, "<body>")?;
    writeln!(page, "<header><h1>{PRODUCT_NAME}</h1></header>")?;
    writeln!(page, "<main>")?;

    // The HTML parser drops one newline right after the start tag, so always
    // emit one; a leading newline in the text then survives.
    writeln!(page, "<textarea id=\"{INPUT_ID}\" spellcheck=\"false\">")?;
    escape_html_body_text(FmtWriter(&mut *page), text)?;
    writeln!(page, "</textarea>")?;

    writeln!(page, "<div id=\"{PREVIEW_ID}\">")?;
    page.push_str(&render(text).to_html());
    writeln!(page, "</div>")?;
    writeln!(page, "</main>")?;
    writeln!(page, "</body>")?;
    writeln!(page, "</html>")
}

/// Recover the markdown text embedded in a page produced by [`export_snapshot`].
///
/// Returns `None` if the page has no input pane.
pub fn import_snapshot(page: &str) -> Option<String> {
    let marker = format!("id=\"{INPUT_ID}\"");
    let attr = page.find(&marker)?;
    let open_end = attr + page[attr..].find('>')? + 1;
    let close = open_end + page[open_end..].find("</textarea>")?;
    let raw = &page[open_end..close];
    let raw = raw
        .strip_prefix("\r\n")
        .or_else(|| raw.strip_prefix('\n'))
        .unwrap_or(raw);
    Some(decode_entities(raw))
}

/// Decode the character references the escaper produces, plus numeric ones.
/// Unknown references are kept literally.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_saved_content() {
        let text = "# Saved Content\n\nThis content was saved to a file";
        let page = export_snapshot(text);
        assert_eq!(import_snapshot(&page).as_deref(), Some(text));
    }

    #[test]
    fn test_round_trip_awkward_text() {
        let text = "\n\nleading newlines </textarea> & &amp; <b>\n  trailing  \n";
        let page = export_snapshot(text);
        assert!(!page.contains("</textarea> &"));
        assert_eq!(import_snapshot(&page).as_deref(), Some(text));
    }

    #[test]
    fn test_page_contract() {
        let page = export_snapshot("**hi**");
        assert!(page.contains("<title>SuperMark</title>"));
        assert!(page.contains("<header><h1>SuperMark</h1></header>"));
        assert!(page.contains("id=\"markdown-input\""));
        assert!(page.contains("<div id=\"preview\">\n<p><strong>hi</strong></p>"));
    }

    #[test]
    fn test_empty_text_still_has_panes() {
        let page = export_snapshot("");
        assert!(page.contains("<div id=\"preview\">\n</div>"));
        assert_eq!(import_snapshot(&page).as_deref(), Some(""));
    }

    #[test]
    fn test_import_without_input_pane() {
        assert_eq!(import_snapshot("<html><body>nothing</body></html>"), None);
    }

    #[test]
    fn test_decode_numeric_references() {
        assert_eq!(decode_entities("&#39;&#x41;&bogus; & x"), "'A&bogus; & x");
    }
}
