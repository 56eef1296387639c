use std::time::{Duration, Instant};

use proptest::prelude::*;
use supermark_renderer::{Block, Inline, render, render_html};

fn heading_of(src: &str) -> Option<(u8, Vec<Inline>)> {
    match render(src).blocks.into_iter().next()? {
        Block::Heading { level, content } => Some((level, content)),
        _ => None,
    }
}

#[test]
fn heading_levels_one_through_six() {
    for n in 1..=6u8 {
        let src = format!("{} X", "#".repeat(n as usize));
        assert_eq!(
            heading_of(&src),
            Some((n, vec![Inline::Text("X".into())])),
            "input {src:?}"
        );
        assert_eq!(render_html(&src), format!("<h{n}>X</h{n}>\n"));
    }
}

#[test]
fn seven_hashes_render_as_literal_text() {
    assert_eq!(render_html("####### X"), "<p>####### X</p>\n");
}

#[test]
fn bullet_lines_render_one_item_each_in_order() {
    for k in 1..=8 {
        let src: Vec<String> = (0..k)
            .map(|i| format!("{} item {i}", ["-", "*", "+"][i % 3]))
            .collect();
        let output = render(&src.join("\n"));
        let [Block::List { items }] = output.blocks.as_slice() else {
            panic!("expected a single list for {k} lines");
        };
        assert_eq!(items.len(), k);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.0, vec![Inline::Text(format!("item {i}"))]);
        }
    }
}

#[test]
fn link_and_image_attributes() {
    let html = render_html("[GitHub](https://github.com)");
    assert!(html.contains("<a href=\"https://github.com\">GitHub</a>"));

    let html = render_html("![alt](data:image/png;base64,AAAA)");
    assert!(html.contains("<img src=\"data:image/png;base64,AAAA\" alt=\"alt\" />"));
}

#[test]
fn long_data_url_is_preserved() {
    let payload = "QUJD".repeat(50_000);
    let src = format!("data:image/png;base64,{payload}");
    let output = render(&format!("before ![image]({src}) after"));
    let Block::Paragraph { content } = &output.blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(
        content[1],
        Inline::Image {
            alt: "image".into(),
            src
        }
    );
}

#[test]
fn code_block_renders_pre() {
    let html = render_html("```javascript\nconst x = 42;\n```");
    assert!(html.starts_with("<pre><code class=\"language-javascript\">"));
}

#[test]
fn empty_input_renders_empty() {
    let output = render("");
    assert!(output.is_empty());
    assert_eq!(output.to_html(), "");
}

#[test]
fn unclosed_delimiters_render_in_linear_time() {
    let inputs = [
        "*a ".repeat(35_000),
        "_a ".repeat(35_000),
        "[".repeat(100_000),
        "[a](".repeat(25_000),
        "**a ".repeat(25_000),
        "`` `".repeat(25_000),
    ];
    for src in &inputs {
        let start = Instant::now();
        let html = render_html(src);
        let elapsed = start.elapsed();
        assert!(html.starts_with("<p>"));
        assert!(
            elapsed < Duration::from_secs(2),
            "{} bytes starting {:?} took {elapsed:?}",
            src.len(),
            &src[..4]
        );
    }
}

proptest! {
    #[test]
    fn render_is_deterministic(src in "\\PC{0,200}") {
        prop_assert_eq!(render(&src), render(&src));
        prop_assert_eq!(render_html(&src), render_html(&src));
    }

    #[test]
    fn markdown_heavy_input_always_renders(src in "[#*_`\\[\\]()!\\\\ \na-z+-]{0,300}") {
        let html = render_html(&src);
        prop_assert!(html.is_empty() || html.ends_with('\n'));
    }

    #[test]
    fn angle_brackets_never_leak(src in "[<>a-z \n*]{0,120}") {
        let html = render_html(&src);
        let stripped = html
            .replace("<p>", "").replace("</p>", "")
            .replace("<strong>", "").replace("</strong>", "")
            .replace("<em>", "").replace("</em>", "")
            .replace("<ul>", "").replace("</ul>", "")
            .replace("<li>", "").replace("</li>", "");
        prop_assert!(!stripped.contains('<'), "unescaped markup in {html:?}");
    }
}
