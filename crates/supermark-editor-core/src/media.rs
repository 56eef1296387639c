//! Dropped-file ingestion.
//!
//! A dropped image becomes a `data:` URL wrapped in image markdown and is
//! spliced into the text at the drop position. Anything that is not an image
//! is rejected before the text is touched.

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use supermark_renderer::DRAG_OVER_CLASS;

use crate::error::IngestError;
use crate::text::{EditorRope, TextBuffer};

/// Alt text used for dropped images.
pub const DEFAULT_ALT: &str = "image";

const GENERIC_MIME: &str = "application/octet-stream";

/// A file handed over by a drop (or paste) event.
#[derive(Clone, Debug)]
pub struct DroppedFile {
    pub name: String,
    /// MIME type reported by the source, if any.
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.map(str::to_owned),
            data: data.into(),
        }
    }

    /// Read a file from disk. The MIME type is left to sniffing.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, None, data))
    }

    /// Declared MIME type, falling back to sniffing the payload.
    pub fn effective_mime_type(&self) -> String {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case(GENERIC_MIME))
            .or_else(|| self.data.sniff_mime_type())
            .unwrap_or(GENERIC_MIME)
            .to_ascii_lowercase()
    }
}

/// Self-contained embeddable encoding of an ingested file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaReference {
    mime_type: String,
    data_url: String,
}

impl MediaReference {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Image markdown referencing this media.
    pub fn markdown(&self, alt: &str) -> String {
        format!("![{alt}]({})", self.data_url)
    }
}

/// Encode an image file as a data URL.
pub fn ingest(file: &DroppedFile) -> Result<MediaReference, IngestError> {
    if file.data.is_empty() {
        return Err(IngestError::Empty {
            name: file.name.clone(),
        });
    }

    let mime_type = file.effective_mime_type();
    if !mime_type.starts_with("image/") {
        return Err(IngestError::NotAnImage {
            name: file.name.clone(),
            mime_type,
        });
    }

    let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(&file.data));
    tracing::debug!(
        name = %file.name,
        mime = %mime_type,
        bytes = file.data.len(),
        "ingested image"
    );
    Ok(MediaReference {
        mime_type,
        data_url,
    })
}

/// Insert `fragment` into `text` at char offset `position` (clamped to the end).
pub fn splice(text: &str, fragment: &str, position: usize) -> String {
    let mut rope = EditorRope::from_str(text);
    rope.insert(position, fragment);
    rope.to_string()
}

/// Drag-over indicator for the drop target.
///
/// Pure presentation state: it never affects the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropZone {
    drag_over: bool,
}

impl DropZone {
    pub fn enter(&mut self) {
        self.drag_over = true;
    }

    pub fn leave(&mut self) {
        self.drag_over = false;
    }

    /// A drop happened, successful or not.
    pub fn finish(&mut self) {
        self.drag_over = false;
    }

    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    /// CSS class to put on the drop target.
    pub fn css_class(&self) -> Option<&'static str> {
        self.drag_over.then_some(DRAG_OVER_CLASS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_ingest_declared_image() {
        let file = DroppedFile::new("a.gif", Some("image/gif"), vec![1u8, 2, 3]);
        let reference = ingest(&file).unwrap();
        assert_eq!(reference.mime_type(), "image/gif");
        assert_eq!(reference.data_url(), "data:image/gif;base64,AQID");
        assert_eq!(reference.markdown("image"), "![image](data:image/gif;base64,AQID)");
    }

    #[test]
    fn test_ingest_sniffs_png() {
        let file = DroppedFile::new("photo", None, PNG_SIGNATURE.to_vec());
        let reference = ingest(&file).unwrap();
        assert_eq!(reference.mime_type(), "image/png");
        assert!(reference.data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_ingest_rejects_non_image() {
        let file = DroppedFile::new("notes.txt", Some("text/plain"), b"hello".to_vec());
        assert_eq!(
            ingest(&file),
            Err(IngestError::NotAnImage {
                name: "notes.txt".into(),
                mime_type: "text/plain".into(),
            })
        );
    }

    #[test]
    fn test_ingest_rejects_empty() {
        let file = DroppedFile::new("empty.png", Some("image/png"), Vec::<u8>::new());
        assert!(matches!(ingest(&file), Err(IngestError::Empty { .. })));
    }

    #[test]
    fn test_encoding_is_lossless() {
        let data: Vec<u8> = (0..=255).collect();
        let file = DroppedFile::new("all.bmp", Some("image/bmp"), data.clone());
        let reference = ingest(&file).unwrap();
        let payload = reference.data_url().split_once(',').unwrap().1;
        assert_eq!(STANDARD.decode(payload).unwrap(), data);
    }

    #[test]
    fn test_splice_preserves_neighbours() {
        assert_eq!(splice("héllo wörld", "[X]", 6), "héllo [X]wörld");
        assert_eq!(splice("abc", "!", 0), "!abc");
        assert_eq!(splice("abc", "!", 100), "abc!");
    }

    #[test]
    fn test_drop_zone_flag() {
        let mut zone = DropZone::default();
        assert_eq!(zone.css_class(), None);
        zone.enter();
        assert_eq!(zone.css_class(), Some("drag-over"));
        zone.leave();
        assert!(!zone.is_drag_over());
        zone.enter();
        zone.finish();
        assert!(!zone.is_drag_over());
    }
}
