//! Debounced save scheduling.
//!
//! Time is passed in explicitly, so the state machine can be driven by a real
//! clock in the binary and by fabricated instants in tests.
//!
//! ```text
//! Idle --touch--> Dirty --due/begin--> Saving --finish--> Idle
//!                   ^                     |
//!                   +-------touch---------+   (finish then leaves it Dirty)
//! ```

use std::time::Duration;

use web_time::Instant;

/// Observable save state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Nothing pending.
    Idle,
    /// Text changed; a save fires once `deadline` passes. A previous save may
    /// still be in flight.
    Dirty { deadline: Instant },
    /// A save of `revision` is in flight and nothing newer is pending.
    Saving { revision: u64 },
}

/// A save that has been fired and awaits acknowledgement.
///
/// Carries the text as it was when the save fired, not when the debounce
/// window opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub revision: u64,
    pub text: String,
}

/// Coalesces bursts of edits into a single save after a quiet period.
///
/// At most one save is in flight; edits arriving meanwhile re-arm the
/// deadline and the next save fires only after the current one is finished,
/// so an older save can never land after a newer one.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    debounce: Duration,
    deadline: Option<Instant>,
    in_flight: Option<u64>,
}

impl SaveScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
            in_flight: None,
        }
    }

    pub fn state(&self) -> SaveState {
        match (self.deadline, self.in_flight) {
            (Some(deadline), _) => SaveState::Dirty { deadline },
            (None, Some(revision)) => SaveState::Saving { revision },
            (None, None) => SaveState::Idle,
        }
    }

    /// Record an edit at `now`, (re)starting the debounce window.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// Whether a save should fire at `now`.
    pub fn due(&self, now: Instant) -> bool {
        self.in_flight.is_none() && self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Whether unsaved edits exist, regardless of the deadline.
    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// When the pending save becomes due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Mark a save of `revision` as fired.
    pub fn begin(&mut self, revision: u64) {
        self.deadline = None;
        self.in_flight = Some(revision);
    }

    /// Acknowledge the save of `revision`. Returns false if that save is not
    /// the one in flight.
    pub fn finish(&mut self, revision: u64) -> bool {
        if self.in_flight == Some(revision) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Drop the pending save. A save already in flight stays registered
    /// until it is acknowledged, so nothing new fires before it lands.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
