//! Band Mixer

use crate::buffer::AudioBuffer;
use crate::error::{DspError, DspResult, Stage};

/// Sum the Low, Mid and High bands sample-by-sample
///
/// All three come from the same source buffer, so a length or sample rate
/// mismatch means the caller wired something wrong.
pub fn mix(bands: &[AudioBuffer; 3]) -> DspResult<AudioBuffer> {
    let [low, mid, high] = bands;

    if low.len() != mid.len() || low.len() != high.len() {
        return Err(DspError::config(
            Stage::Mix,
            format!(
                "band length mismatch: low={}, mid={}, high={}",
                low.len(),
                mid.len(),
                high.len()
            ),
        ));
    }
    if low.sample_rate() != mid.sample_rate() || low.sample_rate() != high.sample_rate() {
        return Err(DspError::config(
            Stage::Mix,
            format!(
                "band sample rate mismatch: low={}Hz, mid={}Hz, high={}Hz",
                low.sample_rate(),
                mid.sample_rate(),
                high.sample_rate()
            ),
        ));
    }

    let samples = low
        .samples()
        .iter()
        .zip(mid.samples())
        .zip(high.samples())
        .map(|((l, m), h)| l + m + h)
        .collect();
    Ok(low.with_samples(samples))
}
