//! FFT Band Energy Analysis
//!
//! Measures how much energy a buffer carries inside a frequency range, so the
//! effect of an equalization can be checked band by band (before vs. after).
//!
//! The whole buffer is analyzed as one Hann-windowed FFT frame. Frequency
//! resolution is therefore `sample_rate / len` Hz per bin.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::band::{Band, HIGH_CROSSOVER_HZ, LOW_CROSSOVER_HZ};
use crate::buffer::AudioBuffer;

/// Lower edge of the audible low band (Hz)
pub const AUDIBLE_LOW_HZ: f64 = 20.0;

/// Upper edge of the audible high band (Hz)
pub const AUDIBLE_HIGH_HZ: f64 = 20000.0;

/// Hann window coefficient
/// Hann window reduces spectral leakage in FFT analysis
fn hann_window(n: usize, size: usize) -> f64 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - (2.0 * std::f64::consts::PI * n as f64 / (size - 1) as f64).cos())
}

/// Single-frame spectrum analyzer for buffers of one fixed length
///
/// Plan once, then measure any number of buffers of that length.
pub struct SpectrumAnalyzer {
    len: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len.max(1));
        Self {
            len,
            window: (0..len).map(|i| hann_window(i, len)).collect(),
            fft,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Power per bin for bins `0..=len/2`
    ///
    /// Input shorter than the planned length is zero-padded, longer input is
    /// truncated.
    pub fn power_spectrum(&self, samples: &[f32]) -> Vec<f64> {
        if self.len == 0 {
            return Vec::new();
        }
        let mut frame: Vec<Complex<f64>> = (0..self.len)
            .map(|i| {
                let s = samples.get(i).copied().map(f64::from).unwrap_or(0.0);
                Complex::new(s * self.window[i], 0.0)
            })
            .collect();
        self.fft.process(&mut frame);

        frame[..=self.len / 2].iter().map(|c| c.norm_sqr()).collect()
    }

    /// Energy in bins whose center frequency lies in `[low_hz, high_hz)`
    pub fn band_energy(&self, buffer: &AudioBuffer, low_hz: f64, high_hz: f64) -> f64 {
        if self.len == 0 || buffer.sample_rate() == 0 {
            return 0.0;
        }
        let bin_hz = f64::from(buffer.sample_rate()) / self.len as f64;
        self.power_spectrum(buffer.samples())
            .iter()
            .enumerate()
            .filter(|(k, _)| {
                let freq = *k as f64 * bin_hz;
                freq >= low_hz && freq < high_hz
            })
            .map(|(_, p)| p)
            .sum()
    }

    /// RMS level (dBFS) of the content in `[low_hz, high_hz)`
    ///
    /// Scaled so a full-length sine of amplitude `A` inside the range reads
    /// `20·log10(A/√2)`.
    pub fn band_rms_db(&self, buffer: &AudioBuffer, low_hz: f64, high_hz: f64) -> f64 {
        let window_power: f64 = self.window.iter().map(|w| w * w).sum();
        if window_power == 0.0 {
            return f64::NEG_INFINITY;
        }
        let mean_square =
            2.0 * self.band_energy(buffer, low_hz, high_hz) / (self.len as f64 * window_power);
        10.0 * mean_square.log10()
    }

    /// Energy in each band's nominal range, in [`Band::ALL`] order
    pub fn band_energies(&self, buffer: &AudioBuffer) -> [f64; 3] {
        Band::ALL.map(|band| {
            let (low, high) = nominal_range(band, buffer.sample_rate());
            self.band_energy(buffer, low, high)
        })
    }
}

/// Nominal analysis range of a band, capped at nyquist
pub fn nominal_range(band: Band, sample_rate: u32) -> (f64, f64) {
    let nyquist = f64::from(sample_rate) / 2.0;
    let (low, high) = match band {
        Band::Low => (AUDIBLE_LOW_HZ, LOW_CROSSOVER_HZ),
        Band::Mid => (LOW_CROSSOVER_HZ, HIGH_CROSSOVER_HZ),
        Band::High => (HIGH_CROSSOVER_HZ, AUDIBLE_HIGH_HZ),
    };
    (low.min(nyquist), high.min(nyquist))
}

/// Energy of `buffer` in `[low_hz, high_hz)`
///
/// Convenience for one-off measurements; plans a new FFT on every call.
pub fn band_energy(buffer: &AudioBuffer, low_hz: f64, high_hz: f64) -> f64 {
    SpectrumAnalyzer::new(buffer.len()).band_energy(buffer, low_hz, high_hz)
}

/// RMS level (dBFS) of `buffer` in `[low_hz, high_hz)`
pub fn band_rms_db(buffer: &AudioBuffer, low_hz: f64, high_hz: f64) -> f64 {
    SpectrumAnalyzer::new(buffer.len()).band_rms_db(buffer, low_hz, high_hz)
}

/// Ratio of two energies in dB
///
/// Two zero energies compare equal (0 dB). Otherwise a zero `after` gives
/// `-inf` and a zero `before` gives `+inf`.
pub fn energy_ratio_db(after: f64, before: f64) -> f64 {
    if after == 0.0 && before == 0.0 {
        return 0.0;
    }
    10.0 * (after / before).log10()
}
