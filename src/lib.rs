//! voxlink: real-time voice relay core.
//!
//! Relays a live, bidirectional voice conversation between a human speaker
//! and a remote speech-to-speech engine while feeding the engine's
//! synthesized audio, resampled, to a video-avatar renderer. The crate owns
//! the resampling stage, the ordered chunk relay, the interaction state
//! machine, and the session-duration ledger; capture devices, the remote
//! engine, the renderer, and the quota service are collaborators behind
//! traits.

pub mod core;

// Re-export commonly used items for convenience
pub use crate::core::audio::AudioFrame;
pub use crate::core::capture::{CaptureDevice, CaptureError};
pub use crate::core::engine::{ConversationEngine, EngineError, EngineEvent, SpeakerRole};
pub use crate::core::quota::{HttpQuotaService, QuotaReceipt, QuotaService, UsageReport};
pub use crate::core::relay::{ChunkRelay, RelayStats};
pub use crate::core::renderer::{RendererSink, SinkError};
pub use crate::core::resample::{ResampleError, Resampler, resample};
pub use crate::core::session::{
    InteractionSession, SessionConfig, SessionError, SessionResult, SessionState, TalkMode,
};
