//! Inline scanner.
//!
//! Single forward pass over a block's text. Delimiter runs, bracket pairs and
//! parenthesis pairs are indexed once up front, so finding the closer of an
//! opener is a lookup rather than a rescan. An opener without a closer is
//! emitted as literal text and scanning continues after it.

use std::collections::HashMap;

use crate::nodes::Inline;

/// Nesting depth past which emphasis and links are treated as literal text.
const MAX_NESTING: usize = 32;

/// Parse inline markdown into nodes. Newlines become [`Inline::SoftBreak`].
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    InlineScanner::new(text, 0).run()
}

struct InlineScanner<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    index: DelimiterIndex,
    /// Backtick run length -> earliest offset known to have no closing run.
    unclosed_code: HashMap<usize, usize>,
    text: String,
    out: Vec<Inline>,
}

/// Byte offsets of a `[label](dest)` construct.
struct LinkParts<'a> {
    label: &'a str,
    dest: &'a str,
    /// Offset just past the closing `)`.
    end: usize,
}

impl<'a> InlineScanner<'a> {
    fn new(src: &'a str, depth: usize) -> Self {
        Self {
            src,
            pos: 0,
            depth,
            index: DelimiterIndex::build(src),
            unclosed_code: HashMap::new(),
            text: String::new(),
            out: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Inline> {
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.escape(),
                '`' => self.code_span(),
                '!' if self.rest().starts_with("![") => self.image(),
                '[' => self.link(),
                '*' | '_' => self.emphasis(c),
                '\n' => {
                    self.flush_text();
                    self.out.push(Inline::SoftBreak);
                    self.pos += 1;
                }
                _ => self.literal(c.len_utf8()),
            }
        }
        self.flush_text();
        self.out
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Copy `len` bytes from the current position into the text buffer.
    fn literal(&mut self, len: usize) {
        self.text.push_str(&self.src[self.pos..self.pos + len]);
        self.pos += len;
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.out.push(Inline::Text(std::mem::take(&mut self.text)));
        }
    }

    fn push_node(&mut self, node: Inline) {
        self.flush_text();
        self.out.push(node);
    }

    fn nested(&self, src: &str) -> Vec<Inline> {
        InlineScanner::new(src, self.depth + 1).run()
    }

    fn escape(&mut self) {
        match self.rest()[1..].chars().next() {
            Some(next) if next.is_ascii_punctuation() => {
                self.pos += 1;
                self.literal(1);
            }
            _ => self.literal(1),
        }
    }

    fn code_span(&mut self) {
        let run = run_length(self.rest(), '`');
        let body_start = self.pos + run;
        if self
            .unclosed_code
            .get(&run)
            .is_some_and(|&from| from <= body_start)
        {
            self.literal(run);
            return;
        }

        let fence = &self.rest()[..run];
        match self.src[body_start..].find(fence) {
            Some(rel) => {
                let raw = &self.src[body_start..body_start + rel];
                let mut code = raw.replace('\n', " ");
                if code.len() >= 2
                    && code.starts_with(' ')
                    && code.ends_with(' ')
                    && !code.trim().is_empty()
                {
                    code = code[1..code.len() - 1].to_string();
                }
                self.push_node(Inline::Code(code));
                self.pos = body_start + rel + run;
            }
            None => {
                self.unclosed_code.entry(run).or_insert(body_start);
                self.literal(run);
            }
        }
    }

    fn image(&mut self) {
        match self.link_parts(self.pos + 1) {
            Some(parts) => {
                self.push_node(Inline::Image {
                    alt: parts.label.to_string(),
                    src: parts.dest.to_string(),
                });
                self.pos = parts.end;
            }
            None => self.literal(1),
        }
    }

    fn link(&mut self) {
        let parts = if self.depth < MAX_NESTING {
            self.link_parts(self.pos)
        } else {
            None
        };
        match parts {
            Some(parts) => {
                let content = self.nested(parts.label);
                self.push_node(Inline::Link {
                    href: parts.dest.to_string(),
                    content,
                });
                self.pos = parts.end;
            }
            None => self.literal(1),
        }
    }

    fn emphasis(&mut self, delim: char) {
        let run = run_length(self.rest(), delim);
        let after = self.src[self.pos + run..].chars().next();
        let before = self.src[..self.pos].chars().next_back();
        let can_open = after.is_some_and(|c| !c.is_whitespace())
            && (delim != '_' || !before.is_some_and(char::is_alphanumeric))
            && self.depth < MAX_NESTING;
        if !can_open {
            self.literal(run);
            return;
        }

        let width = if run >= 2 { 2 } else { 1 };
        let inner_start = self.pos + width;
        match self.index.closer_after(inner_start, delim, width) {
            Some(close) => {
                let content = self.nested(&self.src[inner_start..close]);
                let node = if width == 2 {
                    Inline::Strong(content)
                } else {
                    Inline::Emphasis(content)
                };
                self.push_node(node);
                self.pos = close + width;
            }
            // `**a*` falls back to a literal `*` followed by `*a*`.
            None => self.literal(1),
        }
    }

    /// Parse `[label](dest)` starting at the `[` at byte offset `open`.
    fn link_parts(&self, open: usize) -> Option<LinkParts<'a>> {
        let close = *self.index.brackets.get(&open)?;
        let dest_open = close + 1;
        if !self.src[dest_open..].starts_with('(') {
            return None;
        }
        let end = *self.index.parens.get(&dest_open)?;
        Some(LinkParts {
            label: &self.src[open + 1..close],
            dest: destination(&self.src[dest_open + 1..end]),
            end: end + 1,
        })
    }
}

/// Positions of every closer in a block, computed in one pass.
#[derive(Default)]
struct DelimiterIndex {
    /// `[` offset -> matching `]` offset. Escaped brackets are skipped.
    brackets: HashMap<usize, usize>,
    /// `(` offset -> matching `)` offset on the same line.
    parens: HashMap<usize, usize>,
    /// Ascending offsets of runs that can close emphasis, one list per
    /// (delimiter, width) pair; see [`closer_slot`].
    closers: [Vec<usize>; 4],
}

impl DelimiterIndex {
    fn build(src: &str) -> Self {
        let mut index = Self::default();
        let bytes = src.as_bytes();

        let mut open_parens = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => open_parens.push(i),
                b')' => {
                    if let Some(open) = open_parens.pop() {
                        index.parens.insert(open, i);
                    }
                }
                b'\n' => open_parens.clear(),
                _ => {}
            }
        }

        let mut open_brackets = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                // The escaped character is never a delimiter. A multi-byte
                // character only has its lead byte skipped, which is harmless:
                // continuation bytes never match ASCII.
                b'\\' => i += 2,
                b'[' => {
                    open_brackets.push(i);
                    i += 1;
                }
                b']' => {
                    if let Some(open) = open_brackets.pop() {
                        index.brackets.insert(open, i);
                    }
                    i += 1;
                }
                delim @ (b'*' | b'_') => {
                    let run = bytes[i..].iter().take_while(|&&b| b == delim).count();
                    let before = src[..i].chars().next_back();
                    let after = src[i + run..].chars().next();
                    let closes = before.is_some_and(|c| !c.is_whitespace())
                        && (delim != b'_' || !after.is_some_and(char::is_alphanumeric));
                    if closes {
                        let delim = char::from(delim);
                        if run == 1 {
                            index.closers[closer_slot(delim, 1)].push(i);
                        } else {
                            index.closers[closer_slot(delim, 2)].push(i);
                        }
                    }
                    i += run;
                }
                _ => i += 1,
            }
        }
        index
    }

    /// First run strictly after `from` that closes a `width`-wide `delim`
    /// span. Single delimiters only match lone runs; doubled runs belong to
    /// nested strong spans.
    fn closer_after(&self, from: usize, delim: char, width: usize) -> Option<usize> {
        let offsets = &self.closers[closer_slot(delim, width)];
        let next = offsets.partition_point(|&offset| offset <= from);
        offsets.get(next).copied()
    }
}

fn closer_slot(delim: char, width: usize) -> usize {
    let base = if delim == '*' { 0 } else { 2 };
    base + usize::from(width >= 2)
}

fn run_length(s: &str, c: char) -> usize {
    s.len() - s.trim_start_matches(c).len()
}

/// Link destination: the whole text between the parentheses, trimmed, minus
/// an optional quoted title and optional `<...>` wrapping.
fn destination(raw: &str) -> &str {
    let raw = raw.trim();
    let dest = strip_title(raw).unwrap_or(raw);
    dest.strip_prefix('<')
        .and_then(|d| d.strip_suffix('>'))
        .unwrap_or(dest)
}

/// `dest "title"` or `dest 'title'` yields `dest`.
fn strip_title(raw: &str) -> Option<&str> {
    let quote = raw.chars().next_back().filter(|c| matches!(c, '"' | '\''))?;
    let body = &raw[..raw.len() - 1];
    let dest = &body[..body.rfind(quote)?];
    dest.ends_with([' ', '\t']).then(|| dest.trim_end())
}
