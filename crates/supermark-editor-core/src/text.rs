//! Document text storage.
//!
//! The controller edits the document through [`TextBuffer`]; [`EditorRope`]
//! backs it with a rope so inserts at a drop or cursor position stay cheap on
//! large documents (a single embedded image can be hundreds of KB).

/// Editable document text addressed by char offsets.
///
/// Offsets count Unicode scalar values. Positions past the end clamp to the
/// end.
pub trait TextBuffer {
    fn len_bytes(&self) -> usize;

    fn len_chars(&self) -> usize;

    /// Insert `text` at `char_offset`.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Replace everything with `text`.
    fn set_text(&mut self, text: &str);

    fn to_string(&self) -> String;
}

/// [`TextBuffer`] over a `ropey::Rope`.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(text),
        }
    }
}

impl TextBuffer for EditorRope {
    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        let at = char_offset.min(self.rope.len_chars());
        self.rope.insert(at, text);
    }

    fn set_text(&mut self, text: &str) {
        self.rope = ropey::Rope::from_str(text);
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_counts_chars() {
        let mut rope = EditorRope::from_str("héllo 🌍");
        assert_eq!(rope.len_chars(), 7);
        assert_eq!(rope.len_bytes(), 11);

        rope.insert(6, "big ");
        assert_eq!(rope.to_string(), "héllo big 🌍");
    }

    #[test]
    fn test_insert_past_end_appends() {
        let mut rope = EditorRope::from_str("abc");
        rope.insert(99, "!");
        assert_eq!(rope.to_string(), "abc!");
    }

    #[test]
    fn test_set_text_replaces_everything() {
        let mut rope = EditorRope::new();
        assert_eq!(rope.len_chars(), 0);
        rope.set_text("brand new");
        rope.set_text("newer");
        assert_eq!(rope.to_string(), "newer");
        assert_eq!(rope.len_bytes(), 5);
    }
}
