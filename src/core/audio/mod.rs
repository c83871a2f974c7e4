//! PCM16 audio frames shared across the relay pipeline.
//!
//! Frames are immutable value types: produced once at the capture boundary or
//! the engine boundary, then handed through the pipeline without mutation.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

/// Convert float PCM in [-1, 1] to 16-bit signed samples.
///
/// Values outside [-1, 1] are clamped before scaling, so capture devices that
/// occasionally overshoot do not wrap around.
#[inline]
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// An ordered sequence of 16-bit signed samples tagged with its sample rate.
///
/// Cloning is cheap: the sample buffer is shared, never copied, and never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    samples: Arc<[i16]>,
    sample_rate: u32,
}

impl AudioFrame {
    /// Create a frame from raw 16-bit samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Create a frame from float PCM as delivered by a capture device.
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        Self::new(f32_to_i16(samples), sample_rate)
    }

    /// Create a frame from little-endian PCM16 bytes as delivered by the
    /// remote engine. A trailing odd byte is ignored.
    pub fn from_le_bytes(data: &[u8], sample_rate: u32) -> Self {
        let samples = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(samples, sample_rate)
    }

    /// The samples in temporal order.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples in the frame.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the frame carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration of the frame in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Serialize to little-endian PCM16 for a wire boundary.
    pub fn to_le_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.samples.len() * 2);
        for &sample in self.samples.iter() {
            buf.put_i16_le(sample);
        }
        buf.freeze()
    }
}
