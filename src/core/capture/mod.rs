//! Microphone capture device contract.
//!
//! Capture devices yield float PCM frames at a fixed rate; conversion to
//! PCM16 happens in [`crate::core::audio`] before frames enter the rest of
//! the pipeline. Device enumeration, permission prompts, and OS audio APIs
//! belong to the implementing crate.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Error types for capture device operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    /// The user or platform refused microphone access. Surfaced to the
    /// caller, never retried internally.
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Base trait for microphone capture devices.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the device and begin capture.
    ///
    /// Frames are float PCM in [-1, 1] at `sample_rate()`. The device must
    /// hand frames to the channel without blocking its audio callback; a
    /// full channel drops the frame rather than stalling capture.
    ///
    /// # Returns
    /// * `Result<mpsc::Receiver<Vec<f32>>, CaptureError>` - frame stream or error
    async fn open(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, CaptureError>;

    /// Release the device. Must be idempotent and safe to call even when
    /// `open` never succeeded.
    async fn close(&mut self) -> Result<(), CaptureError>;

    /// The fixed capture rate in Hz (24 kHz in the reference deployment).
    fn sample_rate(&self) -> u32;
}
