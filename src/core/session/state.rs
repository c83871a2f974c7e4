//! State primitives for the interaction session.
//!
//! The externally visible state graph:
//!
//! ```text
//! Idle ──► Connecting ──► ActiveListening ◄──► ActiveSpeaking ──► Stopped
//!              │                 ▲                    │
//!              └── (failure) ──► Idle                 │
//!                                └─── interrupted ◄───┘
//! ```
//!
//! Hot-path guards (hold engagement, finalize re-entrancy, in-flight
//! response) are atomics so the capture pump and the event loop can read
//! them without taking a lock.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Lifecycle states of an interaction session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session running; `start()` is legal.
    Idle,
    /// Acquiring the capture device and opening the engine connection.
    Connecting,
    /// Listening for user speech (possibly muted in push-to-talk mode).
    ActiveListening,
    /// The assistant's synthesized response is being relayed.
    ActiveSpeaking,
    /// Torn down; a fresh session object is needed to talk again.
    Stopped,
}

impl SessionState {
    /// True for the two states in which audio flows.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ActiveListening | Self::ActiveSpeaking)
    }
}

/// Talk modes governing when capture streams to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalkMode {
    /// Capture streams continuously; the engine's VAD ends utterances.
    Continuous,
    /// Capture streams only while an explicit hold signal is engaged.
    PushToTalk,
}

/// Shared state cell with compare-and-set transitions.
pub struct StateCell {
    inner: RwLock<SessionState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionState::Idle),
        }
    }

    pub fn get(&self) -> SessionState {
        *self.inner.read()
    }

    /// Unconditionally move to `next`, returning the previous state.
    pub fn set(&self, next: SessionState) -> SessionState {
        std::mem::replace(&mut *self.inner.write(), next)
    }

    /// Move from `from` to `to`; returns false (and changes nothing) when
    /// the current state is not `from`.
    pub fn transition(&self, from: SessionState, to: SessionState) -> bool {
        let mut state = self.inner.write();
        if *state != from {
            return false;
        }
        *state = to;
        true
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Push-to-talk hold state.
///
/// `engaged` gates the capture pump; `finalizing` is the re-entrancy guard
/// that rejects a new hold while the previous release is still inside its
/// grace window.
pub struct HoldState {
    engaged: AtomicBool,
    finalizing: AtomicBool,
    grace_task: Mutex<Option<JoinHandle<()>>>,
}

impl HoldState {
    pub fn new() -> Self {
        Self {
            engaged: AtomicBool::new(false),
            finalizing: AtomicBool::new(false),
            grace_task: Mutex::new(None),
        }
    }

    pub fn engage(&self) {
        self.engaged.store(true, Ordering::Release);
    }

    pub fn disengage(&self) {
        self.engaged.store(false, Ordering::Release);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    /// Enter the finalizing window; returns false when already finalizing.
    pub fn begin_finalize(&self) -> bool {
        self.finalizing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_finalize(&self) {
        self.finalizing.store(false, Ordering::Release);
    }

    pub fn is_finalizing(&self) -> bool {
        self.finalizing.load(Ordering::Acquire)
    }

    /// Track the grace-delay task, aborting any previous one.
    pub fn set_grace_task(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.grace_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel a pending grace delay, if any.
    pub fn cancel_grace(&self) {
        if let Some(handle) = self.grace_task.lock().take() {
            handle.abort();
        }
    }

    /// Clear everything; used by session teardown.
    pub fn reset(&self) {
        self.cancel_grace();
        self.engaged.store(false, Ordering::Release);
        self.finalizing.store(false, Ordering::Release);
    }
}

impl Default for HoldState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks whether an engine response is in flight.
///
/// Barge-in cancellation and the speech-stopped handler both clear this
/// flag, which is what makes them idempotent with respect to each other
/// regardless of event arrival order.
pub struct ResponseState {
    active: AtomicBool,
}

impl ResponseState {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    pub fn mark_active(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set. Exactly one caller
    /// observes `true` per response, so exactly one cancel is issued.
    pub fn take_active(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Default for ResponseState {
    fn default() -> Self {
        Self::new()
    }
}
