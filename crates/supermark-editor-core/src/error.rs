//! Error types for the editor core.
//!
//! None of these reach the user as a crash: the controller catches store and
//! ingestion failures at its boundary and degrades instead.

use miette::Diagnostic;

/// Failure of the external content store.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum StoreError {
    /// File system failure
    #[error(transparent)]
    #[diagnostic(code(supermark::store::io))]
    Io(#[from] std::io::Error),

    /// Persisted record could not be decoded
    #[error("corrupt snapshot: {0}")]
    #[diagnostic(code(supermark::store::corrupt))]
    Corrupt(#[from] serde_json::Error),

    /// Store refused the operation
    #[error("store unavailable: {0}")]
    #[diagnostic(code(supermark::store::unavailable))]
    Unavailable(String),
}

/// Reasons a dropped file is not embedded.
#[derive(thiserror::Error, Debug, Diagnostic, PartialEq, Eq)]
pub enum IngestError {
    #[error("{name} is not an image ({mime_type})")]
    #[diagnostic(
        code(supermark::media::not_an_image),
        help("only image/* files can be embedded")
    )]
    NotAnImage { name: String, mime_type: String },

    #[error("{name} is empty")]
    #[diagnostic(code(supermark::media::empty))]
    Empty { name: String },
}

/// Invalid editor configuration file.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(code(supermark::config::io))]
    Io(#[from] std::io::Error),

    #[error("config is not valid KDL: {0}")]
    #[diagnostic(code(supermark::config::parse))]
    Parse(#[from] kdl::KdlError),

    #[error("`{node}` expects {expected}")]
    #[diagnostic(code(supermark::config::value))]
    InvalidValue {
        node: &'static str,
        expected: &'static str,
    },
}
