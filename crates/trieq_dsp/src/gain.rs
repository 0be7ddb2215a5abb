//! Gain Stage
//!
//! Scales a band by a decibel gain. Pure elementwise multiply.

use crate::buffer::AudioBuffer;

/// Convert dB gain to linear amplitude
/// Formula: amplitude = 10^(dB/20)
///
/// 0 dB maps to exactly 1.0.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    if db == 0.0 {
        return 1.0;
    }
    10.0_f32.powf(db / 20.0)
}

/// Applies a fixed decibel gain to buffers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainStage {
    gain_db: f32,
    linear: f32,
}

impl GainStage {
    pub fn new(gain_db: f32) -> Self {
        Self {
            gain_db,
            linear: db_to_linear(gain_db),
        }
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Linear multiplier applied to each sample
    pub fn linear(&self) -> f32 {
        self.linear
    }

    /// Scaled copy of `input`; non-finite samples propagate unchanged in kind
    pub fn apply(&self, input: &AudioBuffer) -> AudioBuffer {
        let samples = input.samples().iter().map(|s| s * self.linear).collect();
        input.with_samples(samples)
    }
}
