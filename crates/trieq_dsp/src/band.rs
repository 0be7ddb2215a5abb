//! Band Layout and Crossover Clamping
//!
//! The spectrum is split into exactly three bands at two fixed crossover
//! frequencies. Cutoffs are clamped into the open interval `(0, nyquist)` so
//! that low sample rates still produce a valid design whenever possible.

use std::fmt;

use crate::error::{DspError, DspResult, Stage};

/// Crossover between the low and mid bands (Hz)
pub const LOW_CROSSOVER_HZ: f64 = 250.0;

/// Crossover between the mid and high bands (Hz)
pub const HIGH_CROSSOVER_HZ: f64 = 4000.0;

/// One of the three equalizer bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    /// All bands in mixing order
    pub const ALL: [Band; 3] = [Band::Low, Band::Mid, Band::High];

    /// Human-readable range, as shown next to the gain sliders
    pub fn description(self) -> &'static str {
        match self {
            Band::Low => "Low (20-250 Hz)",
            Band::Mid => "Mid (250-4000 Hz)",
            Band::High => "High (4000-20000 Hz)",
        }
    }

    /// Position of this band in [`Band::ALL`]
    pub fn index(self) -> usize {
        match self {
            Band::Low => 0,
            Band::Mid => 1,
            Band::High => 2,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Band::Low => "Low",
            Band::Mid => "Mid",
            Band::High => "High",
        };
        f.write_str(name)
    }
}

/// Filter shape and cutoff(s) for one band, in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandSpec {
    LowPass { cutoff: f64 },
    BandPass { low: f64, high: f64 },
    HighPass { cutoff: f64 },
}

impl BandSpec {
    /// Compute the clamped spec for `band` at `sample_rate`
    ///
    /// Each cutoff is pulled below `nyquist - 1` and above 1 Hz. Fails with a
    /// configuration error if the result does not sit strictly inside
    /// `(0, nyquist)` or if the band-pass edges collapse.
    pub fn for_band(band: Band, sample_rate: u32) -> DspResult<Self> {
        if sample_rate == 0 {
            return Err(DspError::config(Stage::Design, "sample rate must be positive"));
        }
        let nyquist = f64::from(sample_rate) / 2.0;
        let ceiling = nyquist - 1.0;

        let spec = match band {
            Band::Low => BandSpec::LowPass {
                cutoff: LOW_CROSSOVER_HZ.min(ceiling),
            },
            Band::Mid => BandSpec::BandPass {
                low: LOW_CROSSOVER_HZ.max(1.0),
                high: HIGH_CROSSOVER_HZ.min(ceiling),
            },
            Band::High => BandSpec::HighPass {
                cutoff: HIGH_CROSSOVER_HZ.max(1.0).min(ceiling),
            },
        };
        spec.validate(nyquist)?;
        Ok(spec)
    }

    fn validate(&self, nyquist: f64) -> DspResult<()> {
        if let BandSpec::BandPass { low, high } = *self {
            if low >= high {
                return Err(DspError::config(
                    Stage::Design,
                    format!(
                        "degenerate band: {}Hz..{}Hz collapses at nyquist {}Hz",
                        low, high, nyquist
                    ),
                ));
            }
        }
        for cutoff in self.cutoffs() {
            if !(cutoff > 0.0 && cutoff < nyquist) {
                return Err(DspError::config(
                    Stage::Design,
                    format!("cutoff {}Hz outside (0, {}Hz)", cutoff, nyquist),
                ));
            }
        }
        Ok(())
    }

    /// Cutoff frequencies in ascending order
    pub fn cutoffs(&self) -> Vec<f64> {
        match *self {
            BandSpec::LowPass { cutoff } | BandSpec::HighPass { cutoff } => vec![cutoff],
            BandSpec::BandPass { low, high } => vec![low, high],
        }
    }
}
