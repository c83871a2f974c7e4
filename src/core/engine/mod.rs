//! Remote speech-to-speech conversation engine contract.
//!
//! The engine owns the conversational intelligence: it receives the user's
//! captured audio, runs its own voice-activity detection in continuous talk
//! mode, and streams back synthesized audio deltas plus transcripts. This
//! module defines the trait boundary and the event stream; transport details
//! (websocket framing, auth, retries) live in the implementing crate.
//!
//! Events are delivered over a single bounded channel so the session's update
//! loop observes them strictly in arrival order. The engine makes no ordering
//! promise between `Interrupted` and `SpeechStopped` for the same utterance,
//! so consumers of both must be idempotent.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::audio::AudioFrame;

/// Bounded capacity engines should use when building their event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Who produced a conversation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerRole {
    User,
    Assistant,
}

/// Asynchronous events emitted by the engine after `connect`.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The conversation advanced: a new transcript fragment, a synthesized
    /// audio delta at the engine's fixed output rate, or both.
    ConversationUpdated {
        role: SpeakerRole,
        audio: Option<AudioFrame>,
        transcript: Option<String>,
    },
    /// The user barged in while the assistant was speaking.
    Interrupted,
    /// The assistant finished speaking the current response.
    SpeechStopped,
}

/// Error types for engine operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("not connected: {0}")]
    NotConnected(String),
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Base trait for remote conversation engines.
#[async_trait]
pub trait ConversationEngine: Send + Sync {
    /// Open the connection and return the ordered event stream.
    ///
    /// The engine drops the sending half on disconnect, which the session
    /// treats the same way as an explicit stop.
    ///
    /// # Returns
    /// * `EngineResult<mpsc::Receiver<EngineEvent>>` - event stream or error
    async fn connect(&mut self) -> EngineResult<mpsc::Receiver<EngineEvent>>;

    /// Close the connection. Must be idempotent.
    async fn disconnect(&mut self) -> EngineResult<()>;

    /// True when connected and ready to accept audio.
    fn is_ready(&self) -> bool;

    /// Stream one frame of captured user audio at the capture rate.
    async fn send_audio(&mut self, frame: AudioFrame) -> EngineResult<()>;

    /// Ask the engine to finalize the current user turn and respond
    /// (push-to-talk mode; continuous mode relies on the engine's VAD).
    async fn create_response(&mut self) -> EngineResult<()>;

    /// Cancel the in-flight response, e.g. on barge-in.
    async fn cancel_response(&mut self, reason: &str) -> EngineResult<()>;
}
