//! Avatar renderer sink contract.
//!
//! The renderer consumes PCM16 audio at its own fixed sample rate and is
//! driven entirely by this core; everything behind the trait (player setup,
//! video, lip-sync) belongs to the host application.

use async_trait::async_trait;
use bytes::Bytes;

/// Error types for renderer sink operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("sink not started: {0}")]
    NotStarted(String),
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Base trait for avatar renderer sinks.
///
/// All operations must be safe to call more than once and after `close`;
/// the session's teardown path does not track which collaborators are still
/// live when it runs.
#[async_trait]
pub trait RendererSink: Send + Sync {
    /// Prepare the renderer for audio delivery.
    async fn start(&self) -> Result<(), SinkError>;

    /// Release renderer resources. Must be idempotent.
    async fn close(&self) -> Result<(), SinkError>;

    /// Deliver one chunk of little-endian PCM16 at the renderer's fixed rate.
    ///
    /// Chunks must be played in the order they are delivered.
    async fn send_audio_data(&self, data: Bytes) -> Result<(), SinkError>;

    /// Drop any buffered-but-unplayed audio (barge-in support).
    async fn clear_buffer(&self) -> Result<(), SinkError>;
}
