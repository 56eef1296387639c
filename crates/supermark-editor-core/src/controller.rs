//! Editor controller.
//!
//! Owns the document text and everything derived from it. Every mutation, from
//! typing, loading or a drop, goes through [`EditorController::commit`], which
//! bumps the revision and re-renders before returning, so the output is never
//! behind the text. Saving is the only deferred effect; see
//! [`crate::debounce`].

use std::ops::Range;

use supermark_renderer::{RenderedOutput, render};
use web_time::Instant;

use crate::config::EditorConfig;
use crate::debounce::{SaveScheduler, SaveState, SaveTicket};
use crate::error::IngestError;
use crate::media::{self, DropZone, DroppedFile};
use crate::store::{ContentStore, StoreAdapter};
use crate::text::{EditorRope, TextBuffer};

/// Store fix-up owed once a save superseded by a reset or reload lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterAck {
    /// The document was reset: remove whatever the stale save wrote.
    Clear,
    /// The document was reloaded: write the current text back over it.
    Rewrite,
}

/// Single-document editor state machine.
pub struct EditorController<S> {
    buffer: EditorRope,
    revision: u64,
    output: RenderedOutput,
    scheduler: SaveScheduler,
    drop_zone: DropZone,
    store: StoreAdapter<S>,
    config: EditorConfig,
    after_ack: Option<AfterAck>,
}

impl<S: ContentStore> EditorController<S> {
    /// Create a controller and load the saved document, or the welcome text.
    pub fn new(store: S, config: EditorConfig) -> Self {
        let mut controller = Self {
            buffer: EditorRope::new(),
            revision: 0,
            output: RenderedOutput::default(),
            scheduler: SaveScheduler::new(config.debounce),
            drop_zone: DropZone::default(),
            store: StoreAdapter::new(store, config.storage_key.clone()),
            config,
            after_ack: None,
        };
        controller.on_load();
        controller
    }

    /// (Re)load the document from the store.
    ///
    /// Loaded text is already persisted (or is the built-in welcome text), so
    /// no save is scheduled and any pending one is dropped. A save already in
    /// flight is fenced: once it lands, the loaded state is written back.
    pub fn on_load(&mut self) {
        let (text, restored) = match self.store.load() {
            Some(text) => (text, true),
            None => (self.config.welcome_message.clone(), false),
        };
        self.buffer.set_text(&text);
        self.scheduler.cancel();
        self.fence_in_flight(if restored {
            AfterAck::Rewrite
        } else {
            AfterAck::Clear
        });
        self.commit(None);
        tracing::debug!(restored, revision = self.revision, "document loaded");
    }

    /// The input pane now holds `text`.
    ///
    /// Returns false if nothing changed; an unchanged value is not a new
    /// revision and schedules no save.
    pub fn on_input(&mut self, text: &str, now: Instant) -> bool {
        if self.buffer.len_bytes() == text.len() && self.buffer.to_string() == text {
            return false;
        }
        self.buffer.set_text(text);
        self.commit(Some(now));
        true
    }

    /// Insert typed text at a char offset.
    pub fn insert_at(&mut self, position: usize, text: &str, now: Instant) {
        if text.is_empty() {
            return;
        }
        self.buffer.insert(position, text);
        self.commit(Some(now));
    }

    pub fn on_drag_enter(&mut self) {
        self.drop_zone.enter();
    }

    pub fn on_drag_leave(&mut self) {
        self.drop_zone.leave();
    }

    /// Embed a dropped file at char offset `position`.
    ///
    /// Returns the char range of the inserted markdown. A rejected file leaves
    /// the text untouched. Either way the drag indicator is cleared.
    pub fn on_drop(
        &mut self,
        file: &DroppedFile,
        position: usize,
        now: Instant,
    ) -> Result<Range<usize>, IngestError> {
        self.drop_zone.finish();

        let reference = media::ingest(file).inspect_err(|err| {
            tracing::warn!(%err, "drop ignored");
        })?;
        let fragment = reference.markdown(&self.config.image_alt);
        let start = position.min(self.buffer.len_chars());
        self.buffer.insert(start, &fragment);
        self.commit(Some(now));

        Ok(start..start + fragment.chars().count())
    }

    /// Fire the pending save if its debounce window has elapsed.
    ///
    /// The ticket carries the text at this moment. Hand it back through
    /// [`Self::complete_save`] once the store has acknowledged it.
    pub fn poll_save(&mut self, now: Instant) -> Option<SaveTicket> {
        if !self.scheduler.due(now) {
            return None;
        }
        Some(self.fire_save())
    }

    /// Acknowledge a fired save. A failed save is logged and skipped; it is
    /// not retried until the text changes again.
    pub fn complete_save(&mut self, ticket: &SaveTicket, saved: bool) {
        if !self.scheduler.finish(ticket.revision) {
            tracing::debug!(revision = ticket.revision, "ignoring superseded save ack");
            return;
        }
        if !saved {
            tracing::warn!(revision = ticket.revision, "autosave skipped");
        }
        match self.after_ack.take() {
            Some(AfterAck::Clear) => {
                tracing::debug!(revision = ticket.revision, "clearing superseded save");
                self.store.clear();
            }
            Some(AfterAck::Rewrite) => {
                tracing::debug!(revision = ticket.revision, "rewriting over superseded save");
                self.store.save(&self.buffer.to_string());
            }
            None => {}
        }
    }

    /// Poll and, if due, save synchronously through the store.
    ///
    /// Returns true if a save was attempted.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        match self.poll_save(now) {
            Some(ticket) => {
                self.save_ticket(ticket);
                true
            }
            None => false,
        }
    }

    /// Save unsaved edits immediately, ignoring the debounce window.
    ///
    /// Returns false if there was nothing to save or a save is in flight.
    pub fn flush_now(&mut self) -> bool {
        if !self.scheduler.is_dirty() || self.scheduler.in_flight().is_some() {
            return false;
        }
        let ticket = self.fire_save();
        self.save_ticket(ticket);
        true
    }

    /// Clear saved content and go back to the welcome text.
    ///
    /// A save still in flight may land after the clear; its ack clears again.
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.fence_in_flight(AfterAck::Clear);
        self.store.clear();
        self.buffer.set_text(&self.config.welcome_message);
        self.commit(None);
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn output(&self) -> &RenderedOutput {
        &self.output
    }

    /// Current preview as HTML.
    pub fn html(&self) -> String {
        self.output.to_html()
    }

    pub fn save_state(&self) -> SaveState {
        self.scheduler.state()
    }

    /// When the pending save becomes due, if any.
    pub fn next_save_at(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn is_drag_over(&self) -> bool {
        self.drop_zone.is_drag_over()
    }

    pub fn drop_zone(&self) -> &DropZone {
        &self.drop_zone
    }

    /// Standalone page holding the current text.
    pub fn export_snapshot(&self) -> String {
        supermark_renderer::export_snapshot(&self.text())
    }

    /// Record a new revision: re-render now, schedule a save if `now` is given.
    fn commit(&mut self, now: Option<Instant>) {
        self.revision += 1;
        self.output = render(&self.buffer.to_string());
        if let Some(now) = now {
            self.scheduler.touch(now);
        }
        tracing::trace!(
            revision = self.revision,
            blocks = self.output.blocks.len(),
            "rendered"
        );
    }

    fn fence_in_flight(&mut self, action: AfterAck) {
        if self.scheduler.in_flight().is_some() {
            self.after_ack = Some(action);
        }
    }

    fn fire_save(&mut self) -> SaveTicket {
        self.scheduler.begin(self.revision);
        SaveTicket {
            revision: self.revision,
            text: self.buffer.to_string(),
        }
    }

    fn save_ticket(&mut self, ticket: SaveTicket) {
        let saved = self.store.save(&ticket.text);
        self.complete_save(&ticket, saved);
    }
}
