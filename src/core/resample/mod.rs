//! Anti-alias filtering and decimation for the engine-to-renderer rate drop.
//!
//! The remote engine synthesizes PCM16 at a fixed high rate while the avatar
//! renderer consumes PCM16 at a lower fixed rate. This module provides the
//! conversion: a windowed-sinc low-pass FIR filter suppresses content above
//! the target Nyquist limit, then the filtered signal is decimated by linear
//! interpolation. Only downsampling is supported; requesting the opposite
//! direction is a programming error and fails fast.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Fixed FIR filter length.
pub const FILTER_TAPS: usize = 31;

/// Cutoff frequency as a fraction of the target sample rate, placed just
/// below the new Nyquist limit (0.5) to leave transition-band headroom.
pub const CUTOFF_RATIO: f32 = 0.45;

/// Error types for resampling operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResampleError {
    #[error("unsupported direction: {rate_in} Hz -> {rate_out} Hz (upsampling is not supported)")]
    UnsupportedDirection { rate_in: u32, rate_out: u32 },
    #[error("invalid sample rate: {0} Hz")]
    InvalidRate(u32),
}

/// Immutable low-pass FIR tap coefficients.
///
/// Derived once from a cutoff frequency and a sample rate, normalized to
/// unity DC gain, and shared read-only across all resample calls for a given
/// rate pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterKernel {
    taps: Vec<f32>,
}

impl FilterKernel {
    /// Build a Hamming-windowed sinc low-pass kernel.
    ///
    /// `cutoff_hz` is expressed against `sample_rate` (the rate of the signal
    /// the kernel will be convolved with). Coefficients are normalized so
    /// they sum to exactly 1, giving unity passband gain.
    pub fn lowpass(cutoff_hz: f32, sample_rate: u32) -> Self {
        let mid = (FILTER_TAPS - 1) as f32 / 2.0;
        let fc = cutoff_hz / sample_rate as f32;

        let mut taps: Vec<f32> = (0..FILTER_TAPS)
            .map(|i| {
                let k = i as f32 - mid;
                let ideal = if k == 0.0 {
                    2.0 * fc
                } else {
                    (2.0 * PI * fc * k).sin() / (PI * k)
                };
                let window = 0.54 - 0.46 * (2.0 * PI * i as f32 / (FILTER_TAPS - 1) as f32).cos();
                ideal * window
            })
            .collect();

        let sum: f32 = taps.iter().sum();
        for tap in taps.iter_mut() {
            *tap /= sum;
        }

        Self { taps }
    }

    /// The normalized tap coefficients.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Process-wide cache of kernels keyed by (input rate, output rate).
///
/// Kernels are immutable once built, so sharing them across sessions is safe;
/// the cache only ever grows by the handful of rate pairs a deployment uses.
static KERNEL_CACHE: Lazy<RwLock<HashMap<(u32, u32), Arc<FilterKernel>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn kernel_for(rate_in: u32, rate_out: u32) -> Arc<FilterKernel> {
    if let Some(kernel) = KERNEL_CACHE.read().get(&(rate_in, rate_out)) {
        return kernel.clone();
    }
    let kernel = Arc::new(FilterKernel::lowpass(
        CUTOFF_RATIO * rate_out as f32,
        rate_in,
    ));
    KERNEL_CACHE
        .write()
        .entry((rate_in, rate_out))
        .or_insert(kernel)
        .clone()
}

/// A validated rate-pair conversion handle.
///
/// Construction performs all error checking; `process` is then infallible,
/// performs no I/O, never blocks, and holds no mutable state, so a single
/// instance can serve every audio delta of a session.
#[derive(Debug, Clone)]
pub struct Resampler {
    rate_in: u32,
    rate_out: u32,
    /// None when the conversion is the identity.
    kernel: Option<Arc<FilterKernel>>,
}

impl Resampler {
    /// Create a resampler for the given rate pair.
    ///
    /// # Returns
    /// * `Err(ResampleError::InvalidRate)` - either rate is zero
    /// * `Err(ResampleError::UnsupportedDirection)` - upsampling requested
    pub fn new(rate_in: u32, rate_out: u32) -> Result<Self, ResampleError> {
        if rate_in == 0 {
            return Err(ResampleError::InvalidRate(rate_in));
        }
        if rate_out == 0 {
            return Err(ResampleError::InvalidRate(rate_out));
        }
        if rate_in < rate_out {
            return Err(ResampleError::UnsupportedDirection { rate_in, rate_out });
        }

        let kernel = if rate_in == rate_out {
            None
        } else {
            Some(kernel_for(rate_in, rate_out))
        };

        Ok(Self {
            rate_in,
            rate_out,
            kernel,
        })
    }

    /// Input sample rate in Hz.
    pub fn rate_in(&self) -> u32 {
        self.rate_in
    }

    /// Output sample rate in Hz.
    pub fn rate_out(&self) -> u32 {
        self.rate_out
    }

    /// Convert one buffer of samples.
    ///
    /// Output length is `floor(len / (rate_in / rate_out))`. Filter taps that
    /// fall outside the input bounds contribute zero rather than wrapping.
    pub fn process(&self, samples: &[i16]) -> Vec<i16> {
        let Some(kernel) = &self.kernel else {
            return samples.to_vec();
        };
        if samples.is_empty() {
            return Vec::new();
        }

        let taps = kernel.taps();
        let mid = (FILTER_TAPS / 2) as isize;
        let len = samples.len();

        // Low-pass pass with implicit zero padding at both edges.
        let mut filtered = vec![0.0f32; len];
        for (i, out) in filtered.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (j, &tap) in taps.iter().enumerate() {
                let idx = i as isize + j as isize - mid;
                if idx >= 0 && (idx as usize) < len {
                    acc += tap * samples[idx as usize] as f32;
                }
            }
            *out = acc;
        }

        // Decimate by linear interpolation at the rate ratio.
        let ratio = self.rate_in as f64 / self.rate_out as f64;
        let out_len = (len as f64 / ratio).floor() as usize;
        let mut output = Vec::with_capacity(out_len);
        for i in 0..out_len {
            let pos = i as f64 * ratio;
            let base = pos.floor() as usize;
            let frac = (pos - pos.floor()) as f32;
            let a = filtered[base];
            let b = if base + 1 < len { filtered[base + 1] } else { a };
            let value = a + (b - a) * frac;
            output.push(value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16);
        }

        output
    }
}

/// One-shot conversion of a sample buffer between two rates.
///
/// # Arguments
/// * `samples` - PCM16 samples at `rate_in`
/// * `rate_in` - input sample rate in Hz
/// * `rate_out` - output sample rate in Hz
///
/// # Returns
/// * `Result<Vec<i16>, ResampleError>` - converted samples or error
pub fn resample(samples: &[i16], rate_in: u32, rate_out: u32) -> Result<Vec<i16>, ResampleError> {
    Ok(Resampler::new(rate_in, rate_out)?.process(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_rates_match() {
        let input: Vec<i16> = (0..1000).map(|i| (i % 321) as i16).collect();
        let output = resample(&input, 24000, 24000).expect("identity resample failed");
        assert_eq!(output, input);
    }

    #[test]
    fn test_upsampling_is_rejected() {
        let result = resample(&[0i16; 128], 16000, 24000);
        assert_eq!(
            result,
            Err(ResampleError::UnsupportedDirection {
                rate_in: 16000,
                rate_out: 24000,
            })
        );
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert_eq!(
            Resampler::new(0, 16000).unwrap_err(),
            ResampleError::InvalidRate(0)
        );
        assert_eq!(
            Resampler::new(24000, 0).unwrap_err(),
            ResampleError::InvalidRate(0)
        );
    }

    #[test]
    fn test_output_length_law() {
        let cases = [
            (24000u32, 16000u32, 4800usize, 3200usize),
            (24000, 16000, 4801, 3200),
            (48000, 16000, 3000, 1000),
            (44100, 22050, 999, 499),
        ];
        for (rate_in, rate_out, in_len, expected) in cases {
            let out = resample(&vec![0i16; in_len], rate_in, rate_out).unwrap();
            assert_eq!(
                out.len(),
                expected,
                "wrong output length for {in_len} samples {rate_in} -> {rate_out}"
            );
        }
    }

    #[test]
    fn test_kernel_has_unity_dc_gain() {
        for (rate_in, rate_out) in [(24000u32, 16000u32), (48000, 16000), (44100, 8000)] {
            let kernel = FilterKernel::lowpass(CUTOFF_RATIO * rate_out as f32, rate_in);
            assert_eq!(kernel.taps().len(), FILTER_TAPS);
            let sum: f32 = kernel.taps().iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-6,
                "kernel sum {sum} != 1 for {rate_in} -> {rate_out}"
            );
        }
    }

    #[test]
    fn test_silence_stays_silent() {
        // 4800 samples of silence at 24 kHz down to 16 kHz
        let output = resample(&[0i16; 4800], 24000, 16000).unwrap();
        assert_eq!(output.len(), 3200);
        assert!(output.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_dc_level_is_preserved() {
        // Unity passband gain: a constant signal should come through at the
        // same level away from the zero-padded edges.
        let input = vec![1000i16; 4800];
        let output = resample(&input, 24000, 16000).unwrap();

        for (i, &sample) in output
            .iter()
            .enumerate()
            .skip(FILTER_TAPS)
            .take(output.len() - 2 * FILTER_TAPS)
        {
            assert!(
                (sample - 1000).abs() <= 2,
                "DC level drifted to {sample} at index {i}"
            );
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let output = resample(&[], 24000, 16000).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_resampler_is_reusable() {
        let resampler = Resampler::new(24000, 16000).expect("construction failed");
        assert_eq!(resampler.rate_in(), 24000);
        assert_eq!(resampler.rate_out(), 16000);

        let a = resampler.process(&[100i16; 480]);
        let b = resampler.process(&[100i16; 480]);
        assert_eq!(a, b, "stateless processing must be deterministic");
    }
}
