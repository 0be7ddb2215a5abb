//! Peak Normalizer
//!
//! Prevents clipping of the mixed signal by scaling the whole buffer down
//! when its peak exceeds full scale.
//!
//! # Algorithm
//!
//! - `peak = max(|sample|)`, 0.0 for silence or an empty buffer
//! - `peak <= 1.0`: buffer returned unchanged
//! - `peak > 1.0`: every sample divided by `peak`
//!
//! A single global factor keeps the balance between bands intact. A boosted
//! band is pulled down together with the others rather than limited on its own.

use crate::buffer::AudioBuffer;

/// Full-scale ceiling for normalized output
pub const FULL_SCALE: f32 = 1.0;

/// Scale `input` so its peak does not exceed [`FULL_SCALE`]
pub fn normalize(input: &AudioBuffer) -> AudioBuffer {
    let peak = input.peak();
    if peak <= FULL_SCALE {
        return input.clone();
    }

    // Division keeps the peak sample at exactly 1.0
    let samples = input.samples().iter().map(|s| s / peak).collect();
    input.with_samples(samples)
}
