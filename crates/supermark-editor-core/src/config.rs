//! Editor configuration.
//!
//! Defaults cover everything; an optional KDL file can override them:
//!
//! ```kdl
//! storage-key "markdown-content"
//! debounce-ms 50
//! welcome "# Hello\n\nStart writing."
//! image-alt "image"
//! ```

use std::path::Path;
use std::time::Duration;

use kdl::{KdlDocument, KdlNode};

use crate::error::ConfigError;
use crate::media::DEFAULT_ALT;

/// Key the document is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "markdown-content";

/// Quiet period before an autosave fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Text shown when nothing has been saved yet.
pub const WELCOME_MESSAGE: &str = "# Welcome to SuperMark

Type **markdown** in the editor and the preview updates as you write.

- Headings, lists, code blocks, links and images are supported
- Drop an image onto the editor to embed it
- Your text is saved automatically
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub storage_key: String,
    pub debounce: Duration,
    pub welcome_message: String,
    pub image_alt: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            debounce: DEFAULT_DEBOUNCE,
            welcome_message: WELCOME_MESSAGE.to_string(),
            image_alt: DEFAULT_ALT.to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a KDL config. Missing nodes keep their defaults, unknown nodes
    /// are ignored.
    pub fn from_kdl(src: &str) -> Result<Self, ConfigError> {
        let doc: KdlDocument = src.parse()?;
        let mut config = Self::default();

        if let Some(node) = doc.get("storage-key") {
            config.storage_key = string_arg(node, "storage-key")?;
        }
        if let Some(node) = doc.get("debounce-ms") {
            let ms = first_arg(node)
                .and_then(|v| v.as_i64())
                .and_then(|ms| u64::try_from(ms).ok())
                .ok_or(ConfigError::InvalidValue {
                    node: "debounce-ms",
                    expected: "a non-negative integer",
                })?;
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(node) = doc.get("welcome") {
            config.welcome_message = string_arg(node, "welcome")?;
        }
        if let Some(node) = doc.get("image-alt") {
            config.image_alt = string_arg(node, "image-alt")?;
        }

        Ok(config)
    }

    /// Load from a file, or defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(src) => Self::from_kdl(&src),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn first_arg(node: &KdlNode) -> Option<&kdl::KdlValue> {
    node.entries().first().map(|entry| entry.value())
}

fn string_arg(node: &KdlNode, name: &'static str) -> Result<String, ConfigError> {
    first_arg(node)
        .and_then(|v| v.as_string())
        .map(str::to_owned)
        .ok_or(ConfigError::InvalidValue {
            node: name,
            expected: "a string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.storage_key, "markdown-content");
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.image_alt, "image");
        assert!(config.welcome_message.starts_with("# Welcome to SuperMark"));
    }

    #[test]
    fn test_from_kdl_overrides() {
        let config = EditorConfig::from_kdl(
            r#"
            storage-key "notes"
            debounce-ms 250
            welcome "hi"
            unknown-node 1
            "#,
        )
        .unwrap();
        assert_eq!(config.storage_key, "notes");
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.welcome_message, "hi");
        assert_eq!(config.image_alt, "image");
    }

    #[test]
    fn test_from_kdl_rejects_bad_values() {
        assert!(matches!(
            EditorConfig::from_kdl("debounce-ms \"soon\""),
            Err(ConfigError::InvalidValue {
                node: "debounce-ms",
                ..
            })
        ));
        assert!(matches!(
            EditorConfig::from_kdl("debounce-ms -5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EditorConfig::from_kdl("storage-key 3"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_kdl() {
        assert!(matches!(
            EditorConfig::from_kdl("storage-key \"unterminated"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("none.kdl")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
