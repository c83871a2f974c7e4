pub mod audio;
pub mod capture;
pub mod engine;
pub mod quota;
pub mod relay;
pub mod renderer;
pub mod resample;
pub mod session;

// Re-export commonly used types for convenience
pub use audio::AudioFrame;
pub use capture::{CaptureDevice, CaptureError};
pub use engine::{
    ConversationEngine, EVENT_CHANNEL_CAPACITY, EngineError, EngineEvent, EngineResult,
    SpeakerRole,
};
pub use quota::{HttpQuotaService, QuotaError, QuotaReceipt, QuotaService, UsageReport};
pub use relay::{ChunkRelay, DeliveryErrorCallback, RelayStats};
pub use renderer::{RendererSink, SinkError};
pub use resample::{FilterKernel, ResampleError, Resampler, resample};
pub use session::{
    DurationLedger, InteractionSession, SessionConfig, SessionError, SessionErrorCallback,
    SessionResult, SessionState, StateChangeCallback, TalkMode, TranscriptCallback,
};
