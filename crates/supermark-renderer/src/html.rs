//! HTML serialization of a [`RenderedOutput`].
//!
//! Text is escaped; link and image destinations pass through unchanged apart
//! from attribute escaping, so `data:` URLs come out exactly as written.

use std::fmt;

use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_html, escape_html_body_text};

use crate::nodes::{Block, Inline, ListItem, RenderedOutput};

struct HtmlWriter<'a, W> {
    output: &'a RenderedOutput,

    /// Writer to write to.
    writer: W,

    /// Whether or not the last write wrote a newline.
    end_newline: bool,
}

impl<'a, W> HtmlWriter<'a, W>
where
    W: StrWrite,
{
    fn new(output: &'a RenderedOutput, writer: W) -> Self {
        Self {
            output,
            writer,
            end_newline: true,
        }
    }

    /// Writes a new line.
    #[inline]
    fn write_newline(&mut self) -> Result<(), W::Error> {
        self.end_newline = true;
        self.writer.write_str("\n")
    }

    /// Writes a buffer, and tracks whether or not a newline was written.
    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)?;

        if !s.is_empty() {
            self.end_newline = s.ends_with('\n');
        }
        Ok(())
    }

    fn run(mut self) -> Result<(), W::Error> {
        for block in &self.output.blocks {
            if !self.end_newline {
                self.write_newline()?;
            }
            self.block(block)?;
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), W::Error> {
        match block {
            Block::Heading { level, content } => {
                let level = (*level).clamp(1, 6);
                self.write(&format!("<h{level}>"))?;
                self.inlines(content)?;
                self.write(&format!("</h{level}>\n"))
            }
            Block::Paragraph { content } => {
                self.write("<p>")?;
                self.inlines(content)?;
                self.write("</p>\n")
            }
            Block::List { items } => {
                self.write("<ul>\n")?;
                for ListItem(content) in items {
                    self.write("<li>")?;
                    self.inlines(content)?;
                    self.write("</li>\n")?;
                }
                self.write("</ul>\n")
            }
            Block::CodeBlock { lang, code } => {
                match lang {
                    Some(lang) => {
                        self.write("<pre><code class=\"language-")?;
                        escape_html(&mut self.writer, lang)?;
                        self.write("\">")?;
                    }
                    None => self.write("<pre><code>")?,
                }
                escape_html_body_text(&mut self.writer, code)?;
                self.write("</code></pre>\n")
            }
        }
    }

    fn inlines(&mut self, inlines: &[Inline]) -> Result<(), W::Error> {
        for inline in inlines {
            self.inline(inline)?;
        }
        Ok(())
    }

    fn inline(&mut self, inline: &Inline) -> Result<(), W::Error> {
        match inline {
            Inline::Text(text) => {
                escape_html_body_text(&mut self.writer, text)?;
                self.end_newline = text.ends_with('\n');
                Ok(())
            }
            Inline::Strong(content) => {
                self.write("<strong>")?;
                self.inlines(content)?;
                self.write("</strong>")
            }
            Inline::Emphasis(content) => {
                self.write("<em>")?;
                self.inlines(content)?;
                self.write("</em>")
            }
            Inline::Code(code) => {
                self.write("<code>")?;
                escape_html_body_text(&mut self.writer, code)?;
                self.write("</code>")
            }
            Inline::Link { href, content } => {
                self.write("<a href=\"")?;
                escape_html(&mut self.writer, href)?;
                self.write("\">")?;
                self.inlines(content)?;
                self.write("</a>")
            }
            Inline::Image { alt, src } => {
                self.write("<img src=\"")?;
                escape_html(&mut self.writer, src)?;
                self.write("\" alt=\"")?;
                escape_html(&mut self.writer, alt)?;
                self.write("\" />")
            }
            Inline::SoftBreak => self.write_newline(),
        }
    }
}

/// Write `output` as HTML into any [`fmt::Write`] sink.
pub fn write_html_fmt<W: fmt::Write>(writer: W, output: &RenderedOutput) -> fmt::Result {
    HtmlWriter::new(output, FmtWriter(writer)).run()
}

/// Render `output` to an HTML string.
pub fn push_html(output: &RenderedOutput) -> String {
    let mut html = String::new();
    if let Err(err) = write_html_fmt(&mut html, output) {
        tracing::warn!(%err, "html serialization stopped early");
    }
    html
}

#[cfg(test)]
mod tests {
    use crate::render;

    fn html(src: &str) -> String {
        render(src).to_html()
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(html(""), "");
    }

    #[test]
    fn test_heading_and_strong() {
        insta::assert_snapshot!(html("# Hello World\n\nThis is a **test**"), @r"
        <h1>Hello World</h1>
        <p>This is a <strong>test</strong></p>
        ");
    }

    #[test]
    fn test_list() {
        insta::assert_snapshot!(html("## Shopping List\n- Item 1\n- Item 2\n- Item 3"), @r"
        <h2>Shopping List</h2>
        <ul>
        <li>Item 1</li>
        <li>Item 2</li>
        <li>Item 3</li>
        </ul>
        ");
    }

    #[test]
    fn test_code_block() {
        insta::assert_snapshot!(html("```javascript\nconst x = 42 < 43;\n```"), @r#"
        <pre><code class="language-javascript">const x = 42 &lt; 43;
        </code></pre>
        "#);
    }

    #[test]
    fn test_link_href_passthrough() {
        assert_eq!(
            html("[GitHub](https://github.com)"),
            "<p><a href=\"https://github.com\">GitHub</a></p>\n"
        );
    }

    #[test]
    fn test_image_src_is_unmodified() {
        assert_eq!(
            html("![alt](data:image/png;base64,AAAA+/==)"),
            "<p><img src=\"data:image/png;base64,AAAA+/==\" alt=\"alt\" /></p>\n"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(
            html("<script>alert('x')</script> & **<b>**"),
            "<p>&lt;script&gt;alert('x')&lt;/script&gt; &amp; <strong>&lt;b&gt;</strong></p>\n"
        );
    }

    #[test]
    fn test_attribute_injection_is_escaped() {
        assert_eq!(
            html("[x](a\"onmouseover=\"b)"),
            "<p><a href=\"a&quot;onmouseover=&quot;b\">x</a></p>\n"
        );
    }

    #[test]
    fn test_soft_break_keeps_newline() {
        assert_eq!(html("a\nb"), "<p>a\nb</p>\n");
    }
}
