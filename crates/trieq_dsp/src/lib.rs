//! Trieq DSP - Digital Signal Processing Module
//!
//! This crate provides the building blocks of the three-band equalizer:
//! - Crossover clamping for arbitrary sample rates
//! - Order-4 Butterworth low-pass / band-pass / high-pass design
//! - Zero-phase (forward-backward) filtering with odd edge reflection
//! - Decibel gain stage, band mixer and peak normalizer
//! - FFT band energy measurement for before/after comparisons
//!
//! # Architecture
//!
//! Every stage is a pure function of its inputs: it borrows an
//! [`AudioBuffer`] and returns a new one of identical length. Nothing is
//! cached between calls, so stages can run on any thread without locking.
//!
//! ```text
//! FilterDesigner ──▶ ZeroPhaseFilter ×3 ──▶ GainStage ×3 ──▶ mix ──▶ normalize
//! ```

mod band;
mod buffer;
mod design;
mod error;
mod gain;
mod mixer;
mod normalize;
mod presets;
pub mod spectrum;
mod zero_phase;

pub use band::{Band, BandSpec, HIGH_CROSSOVER_HZ, LOW_CROSSOVER_HZ};
pub use buffer::AudioBuffer;
pub use design::{
    BandFilter, FilterCoefficients, FilterDesigner, SecondOrderSection, FILTER_ORDER,
};
pub use error::{DspError, DspResult, ErrorKind, Stage};
pub use gain::{db_to_linear, GainStage};
pub use mixer::mix;
pub use normalize::{normalize, FULL_SCALE};
pub use presets::{find_preset, Preset, PRESETS};
pub use spectrum::SpectrumAnalyzer;
pub use zero_phase::ZeroPhaseFilter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let _designer = FilterDesigner::new(48000);
        let _gain = GainStage::new(0.0);
        let _buffer = AudioBuffer::silence(16, 48000);
    }

    #[test]
    fn test_stages_chain_end_to_end() {
        let input = AudioBuffer::new(
            (0..2000).map(|i| (i as f32 * 0.05).sin() * 0.8).collect(),
            48000,
        );
        let filters = FilterDesigner::new(48000).design_all().unwrap();
        let bands: [AudioBuffer; 3] = core::array::from_fn(|i| {
            let filtered = ZeroPhaseFilter::new(&filters[i].coefficients)
                .apply(&input)
                .unwrap();
            GainStage::new(12.0).apply(&filtered)
        });
        let output = normalize(&mix(&bands).unwrap());

        assert_eq!(output.len(), input.len());
        assert!(output.peak() <= FULL_SCALE);
    }
}
