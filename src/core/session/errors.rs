//! Error types for interaction sessions.
//!
//! Only connection-level and quota-level failures are surfaced to callers;
//! filter math and queue state never produce errors that cross this
//! boundary.

use crate::core::capture::CaptureError;
use crate::core::engine::EngineError;
use crate::core::renderer::SinkError;
use crate::core::resample::ResampleError;

/// Error types for interaction session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The capture device refused access. Surfaced once, never retried.
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),
    /// Opening the remote engine connection failed; the session is back in
    /// `Idle` and the caller may invoke `start()` again.
    #[error("remote engine connect failed: {0}")]
    RemoteConnectFailure(String),
    /// The remote engine dropped the connection while the session was
    /// active; teardown has already run.
    #[error("remote engine disconnected")]
    RemoteDisconnect,
    /// The requested operation is not legal in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The quota service flagged the customer as out of quota; `start()`
    /// stays blocked until `revalidate()` is called.
    #[error("session quota exceeded; external re-validation required")]
    QuotaExceeded,
    #[error("resampler error: {0}")]
    Resample(#[from] ResampleError),
    #[error("renderer sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
}

/// Result type for interaction session operations
pub type SessionResult<T> = Result<T, SessionError>;
