//! Equalizer Pipeline
//!
//! Sequences the DSP stages for one call:
//!
//! ```text
//!                ┌─▶ ZeroPhaseFilter(Low)  ─▶ GainStage(low_db)  ─┐
//! input ─design──┼─▶ ZeroPhaseFilter(Mid)  ─▶ GainStage(mid_db)  ─┼─▶ mix ─▶ normalize ─▶ output
//!                └─▶ ZeroPhaseFilter(High) ─▶ GainStage(high_db) ─┘
//! ```
//!
//! The three band branches share nothing but a read-only borrow of the input,
//! so they run as independent rayon tasks and are joined before mixing.
//! The first failure (in band order) aborts the call; no partial output is
//! ever returned.

use rayon::prelude::*;
use tracing::{debug, warn};
use trieq_dsp::{
    mix, normalize, AudioBuffer, BandFilter, DspError, DspResult, FilterDesigner, GainStage,
    Stage, ZeroPhaseFilter,
};

use crate::config::{EqSettings, GainSpec, ProcessingMode};

/// Output of one equalizer call
pub type EqualizerResult = Result<AudioBuffer, DspError>;

/// Three-band zero-phase equalizer
///
/// Holds only its settings. Every call designs fresh filters for the input's
/// sample rate, so one instance can serve buffers at different rates from
/// several threads at once.
#[derive(Debug, Clone, Default)]
pub struct Equalizer {
    settings: EqSettings,
}

impl Equalizer {
    pub fn new(settings: EqSettings) -> Self {
        Self { settings }
    }

    /// Get current configuration
    pub fn settings(&self) -> &EqSettings {
        &self.settings
    }

    /// Equalize one channel
    pub fn process(&self, input: &AudioBuffer) -> EqualizerResult {
        let result = run(input, &self.settings.gains, self.settings.mode);
        if let Err(e) = &result {
            warn!(
                "Equalizer failed on {} samples at {}Hz: {}",
                input.len(),
                input.sample_rate(),
                e
            );
        }
        result
    }

    /// Equalize several channels independently with the same gains
    ///
    /// Channels never influence each other (no shared normalization). Any
    /// channel failure fails the whole call; the error of the lowest-index
    /// failing channel is returned.
    pub fn process_channels(&self, channels: &[AudioBuffer]) -> DspResult<Vec<AudioBuffer>> {
        let results: Vec<EqualizerResult> = match self.settings.mode {
            ProcessingMode::Parallel => channels.par_iter().map(|c| self.process(c)).collect(),
            ProcessingMode::Sequential => channels.iter().map(|c| self.process(c)).collect(),
        };
        results.into_iter().collect()
    }
}

/// Equalize `input` with the given gains using the default (parallel) mode
pub fn equalize(input: &AudioBuffer, gains: &GainSpec) -> EqualizerResult {
    Equalizer::new(EqSettings::new(*gains)).process(input)
}

/// Equalize a raw sample slice
///
/// Convenience entry point for collaborators that hand over plain samples
/// and a sample rate. The caller's slice is not modified.
pub fn equalize_samples(
    samples: &[f32],
    sample_rate: u32,
    gain_low_db: f32,
    gain_mid_db: f32,
    gain_high_db: f32,
) -> DspResult<Vec<f32>> {
    let input = AudioBuffer::new(samples.to_vec(), sample_rate);
    let gains = GainSpec::new(gain_low_db, gain_mid_db, gain_high_db);
    equalize(&input, &gains).map(AudioBuffer::into_samples)
}

fn run(input: &AudioBuffer, gains: &GainSpec, mode: ProcessingMode) -> EqualizerResult {
    debug!(
        "Equalizing {} samples at {}Hz (low={}dB, mid={}dB, high={}dB, {:?})",
        input.len(),
        input.sample_rate(),
        gains.low_db,
        gains.mid_db,
        gains.high_db,
        mode
    );

    let filters = FilterDesigner::new(input.sample_rate()).design_all()?;
    check_length(input, &filters)?;

    let results: Vec<DspResult<AudioBuffer>> = match mode {
        ProcessingMode::Parallel => filters
            .par_iter()
            .map(|filter| process_band(filter, input, gains))
            .collect(),
        ProcessingMode::Sequential => filters
            .iter()
            .map(|filter| process_band(filter, input, gains))
            .collect(),
    };
    let bands: Vec<AudioBuffer> = results.into_iter().collect::<DspResult<_>>()?;
    let bands: [AudioBuffer; 3] = bands
        .try_into()
        .map_err(|_| DspError::Configuration {
            stage: Stage::Mix,
            reason: "expected exactly three bands".into(),
        })?;

    let mixed = mix(&bands)?;
    if !mixed.is_finite() {
        return Err(DspError::NumericOverflow {
            band: None,
            stage: Stage::Mix,
        });
    }

    let output = normalize(&mixed);
    debug!(
        "Equalized: mixed peak {:.4}, output peak {:.4}",
        mixed.peak(),
        output.peak()
    );
    Ok(output)
}

/// Reject inputs too short for the longest filter before any band runs
fn check_length(input: &AudioBuffer, filters: &[BandFilter; 3]) -> DspResult<()> {
    let longest = filters
        .iter()
        .max_by_key(|filter| filter.coefficients.ntaps())
        .map(|filter| (filter.band, ZeroPhaseFilter::new(&filter.coefficients).padlen()));

    match longest {
        Some((band, required)) if input.len() <= required => Err(DspError::InsufficientSamples {
            band: Some(band),
            required,
            actual: input.len(),
        }),
        _ => Ok(()),
    }
}

fn process_band(
    filter: &BandFilter,
    input: &AudioBuffer,
    gains: &GainSpec,
) -> DspResult<AudioBuffer> {
    let band = filter.band;
    let filtered = ZeroPhaseFilter::new(&filter.coefficients)
        .apply(input)
        .map_err(|e| e.in_band(band))?;

    let gained = GainStage::new(gains.for_band(band)).apply(&filtered);
    if !gained.is_finite() {
        return Err(DspError::NumericOverflow {
            band: Some(band),
            stage: Stage::Gain,
        });
    }
    Ok(gained)
}
