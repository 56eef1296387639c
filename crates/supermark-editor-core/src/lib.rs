//! supermark-editor-core: editor logic without UI dependencies.
//!
//! This crate provides:
//! - `EditorController` - owns the document text, re-renders on every change
//!   and debounces saves
//! - `ContentStore` trait with `MemoryStore` and `FileStore`, wrapped by the
//!   failure-absorbing `StoreAdapter`
//! - Media ingestion: dropped images to `data:` URL markdown
//! - `TextBuffer` trait and the ropey-backed `EditorRope`
//! - `EditorConfig` with KDL overrides

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod media;
pub mod store;
pub mod text;

pub use config::{DEFAULT_DEBOUNCE, DEFAULT_STORAGE_KEY, EditorConfig, WELCOME_MESSAGE};
pub use controller::EditorController;
pub use debounce::{SaveScheduler, SaveState, SaveTicket};
pub use error::{ConfigError, IngestError, StoreError};
pub use media::{DEFAULT_ALT, DropZone, DroppedFile, MediaReference, ingest, splice};
pub use store::{ContentStore, FileStore, MemoryStore, PersistedSnapshot, StoreAdapter};
pub use supermark_renderer::{RenderedOutput, render};
pub use text::{EditorRope, TextBuffer};
pub use web_time::Instant;
