//! Configuration types for interaction sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::state::TalkMode;

/// Default capture rate of the reference deployment (Hz).
pub const DEFAULT_CAPTURE_RATE: u32 = 24_000;

/// Output rate of the remote engine's synthesized audio deltas (Hz).
pub const DEFAULT_ENGINE_RATE: u32 = 24_000;

/// Fixed input rate of the avatar renderer (Hz).
pub const DEFAULT_RENDERER_RATE: u32 = 16_000;

/// Grace delay after a push-to-talk release before the turn is finalized,
/// long enough that trailing speech is not truncated.
pub const DEFAULT_RELEASE_GRACE_MS: u64 = 500;

/// Configuration for an interaction session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Talk mode governing when capture streams to the engine.
    pub talk_mode: TalkMode,
    /// Sample rate of frames delivered by the capture device (Hz).
    pub capture_rate: u32,
    /// Sample rate of the engine's audio deltas (Hz).
    pub engine_rate: u32,
    /// Fixed input rate of the avatar renderer (Hz). Must not exceed
    /// `engine_rate`; the relay only downsamples.
    pub renderer_rate: u32,
    /// Push-to-talk release grace delay in milliseconds.
    pub release_grace_ms: u64,
    /// Session identifier reported to the quota service. Generated when
    /// absent.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Avatar face identifier reported to the quota service.
    pub face_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            talk_mode: TalkMode::Continuous,
            capture_rate: DEFAULT_CAPTURE_RATE,
            engine_rate: DEFAULT_ENGINE_RATE,
            renderer_rate: DEFAULT_RENDERER_RATE,
            release_grace_ms: DEFAULT_RELEASE_GRACE_MS,
            session_id: None,
            face_id: String::new(),
        }
    }
}

impl SessionConfig {
    /// Create a config for the given talk mode and avatar face with the
    /// reference-deployment rates.
    pub fn new(talk_mode: TalkMode, face_id: impl Into<String>) -> Self {
        Self {
            talk_mode,
            face_id: face_id.into(),
            ..Default::default()
        }
    }

    /// The release grace delay as a `Duration`.
    pub fn release_grace(&self) -> Duration {
        Duration::from_millis(self.release_grace_ms)
    }
}
