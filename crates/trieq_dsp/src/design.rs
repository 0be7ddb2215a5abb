//! Butterworth Filter Design
//!
//! Builds the low-pass, band-pass and high-pass filters that split the
//! spectrum into three bands.
//!
//! # Algorithm
//!
//! 1. Analog Butterworth prototype of order 4 (poles evenly spaced on the
//!    left half of the unit circle, no zeros).
//! 2. Cutoffs are pre-warped with `4 * tan(pi * f / fs)` so the digital
//!    filter hits them exactly after step 4.
//! 3. Frequency transform to low-pass, high-pass or band-pass. The band-pass
//!    transform maps each prototype pole to a pair, so the mid band realizes
//!    8 poles from the same order-4 prototype.
//! 4. Bilinear transform to the z-plane, then grouping of conjugate pole
//!    pairs and their nearest zeros into second-order sections. The
//!    equivalent `b`/`a` taps are available for inspection, but filtering
//!    always runs section by section.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use crate::band::{Band, BandSpec};
use crate::error::{DspError, DspResult, Stage};

/// Order of the analog prototype used for every band
pub const FILTER_ORDER: usize = 4;

/// Bilinear transform constant for a normalized sample rate of 2 (`2 * fs`)
const BILINEAR_K: f64 = 4.0;

/// One biquad of a cascade, normalized so that `a[0] == 1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondOrderSection {
    b: [f64; 3],
    a: [f64; 3],
}

impl SecondOrderSection {
    /// Build from raw taps, normalizing by `a[0]`
    ///
    /// Fails if `a[0]` is zero or any tap is non-finite.
    pub fn new(b: [f64; 3], a: [f64; 3]) -> DspResult<Self> {
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(DspError::config(
                Stage::Design,
                "leading feedback tap must be finite and non-zero",
            ));
        }
        if !b.iter().chain(a.iter()).all(|c| c.is_finite()) {
            return Err(DspError::config(Stage::Design, "non-finite filter tap"));
        }
        Ok(Self {
            b: b.map(|c| c / a0),
            a: a.map(|c| c / a0),
        })
    }

    /// Pass-through section
    pub fn identity() -> Self {
        Self {
            b: [1.0, 0.0, 0.0],
            a: [1.0, 0.0, 0.0],
        }
    }

    /// Feedforward taps
    pub fn b(&self) -> &[f64; 3] {
        &self.b
    }

    /// Feedback taps (`a[0] == 1.0`)
    pub fn a(&self) -> &[f64; 3] {
        &self.a
    }

    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    fn response_at(&self, w: f64) -> Complex64 {
        let eval = |taps: &[f64; 3]| {
            taps.iter()
                .enumerate()
                .fold(Complex64::new(0.0, 0.0), |acc, (k, &c)| {
                    acc + Complex64::from_polar(c, -w * k as f64)
                })
        };
        eval(&self.b) / eval(&self.a)
    }
}

/// Cascade of second-order sections realizing one band filter
///
/// The high-order transfer function is never filtered as a single
/// polynomial: with poles clustered near `z = 1` (low cutoffs at high sample
/// rates) expanded taps lose most of their precision.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    sections: Vec<SecondOrderSection>,
}

impl FilterCoefficients {
    /// Fails if `sections` is empty
    pub fn new(sections: Vec<SecondOrderSection>) -> DspResult<Self> {
        if sections.is_empty() {
            return Err(DspError::config(Stage::Design, "no filter sections"));
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[SecondOrderSection] {
        &self.sections
    }

    /// Feedforward taps of the equivalent single transfer function
    pub fn b(&self) -> Vec<f64> {
        expand(self.sections.iter().map(|s| s.b()))
    }

    /// Feedback taps of the equivalent single transfer function
    pub fn a(&self) -> Vec<f64> {
        expand(self.sections.iter().map(|s| s.a()))
    }

    /// Tap count of the equivalent single transfer function
    pub fn ntaps(&self) -> usize {
        2 * self.sections.len() + 1
    }

    /// Number of poles in the transfer function
    pub fn order(&self) -> usize {
        2 * self.sections.len()
    }

    /// Magnitude response at `freq` Hz (linear)
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        self.sections
            .iter()
            .map(|s| s.response_at(w))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    pub fn dc_gain(&self) -> f64 {
        self.sections.iter().map(SecondOrderSection::dc_gain).product()
    }
}

/// Multiply out section polynomials
fn expand<'a>(taps: impl Iterator<Item = &'a [f64; 3]>) -> Vec<f64> {
    taps.fold(vec![1.0], |acc, section| {
        let mut out = vec![0.0; acc.len() + 2];
        for (i, c) in acc.iter().enumerate() {
            for (j, t) in section.iter().enumerate() {
                out[i + j] += c * t;
            }
        }
        out
    })
}

/// A designed filter together with the band it isolates
#[derive(Debug, Clone, PartialEq)]
pub struct BandFilter {
    pub band: Band,
    pub spec: BandSpec,
    pub coefficients: FilterCoefficients,
}

/// Designs the three band filters for one sample rate
///
/// Stateless apart from the sample rate; designing twice gives identical taps.
#[derive(Debug, Clone, Copy)]
pub struct FilterDesigner {
    sample_rate: u32,
}

impl FilterDesigner {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Design the filter for a single band
    pub fn design(&self, band: Band) -> DspResult<BandFilter> {
        let spec = BandSpec::for_band(band, self.sample_rate)?;
        let fs = f64::from(self.sample_rate);
        let prototype = Zpk::butterworth(FILTER_ORDER);

        let analog = match spec {
            BandSpec::LowPass { cutoff } => prototype.to_lowpass(prewarp(cutoff, fs)),
            BandSpec::HighPass { cutoff } => prototype.to_highpass(prewarp(cutoff, fs)),
            BandSpec::BandPass { low, high } => {
                let (w1, w2) = (prewarp(low, fs), prewarp(high, fs));
                prototype.to_bandpass((w1 * w2).sqrt(), w2 - w1)
            }
        };

        let digital = analog.bilinear();
        if let Some(pole) = digital.poles.iter().find(|p| !(p.norm() < 1.0)) {
            return Err(DspError::config(
                Stage::Design,
                format!(
                    "{} band filter unstable at {}Hz: pole magnitude {}",
                    band,
                    self.sample_rate,
                    pole.norm()
                ),
            ));
        }

        Ok(BandFilter {
            band,
            spec,
            coefficients: FilterCoefficients::new(digital.to_sections()?)?,
        })
    }

    /// Design all three filters in [`Band::ALL`] order
    pub fn design_all(&self) -> DspResult<[BandFilter; 3]> {
        Ok([
            self.design(Band::Low)?,
            self.design(Band::Mid)?,
            self.design(Band::High)?,
        ])
    }
}

/// Pre-warp a cutoff (Hz) for the bilinear transform at normalized rate 2
fn prewarp(freq: f64, sample_rate: f64) -> f64 {
    BILINEAR_K * (PI * freq / sample_rate).tan()
}

/// Zeros, poles and gain of a transfer function
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

impl Zpk {
    /// Analog Butterworth low-pass prototype with unit cutoff
    fn butterworth(order: usize) -> Self {
        let n = order as f64;
        let poles = (0..order)
            .map(|k| {
                let m = (2 * k) as f64 - n + 1.0;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();
        Self {
            zeros: Vec::new(),
            poles,
            gain: 1.0,
        }
    }

    fn degree(&self) -> usize {
        self.poles.len() - self.zeros.len()
    }

    fn to_lowpass(&self, wo: f64) -> Self {
        Self {
            zeros: self.zeros.iter().map(|z| *z * wo).collect(),
            poles: self.poles.iter().map(|p| *p * wo).collect(),
            gain: self.gain * wo.powi(self.degree() as i32),
        }
    }

    fn to_highpass(&self, wo: f64) -> Self {
        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|z| wo / *z).collect();
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(self.degree()));

        let prod_z = product(self.zeros.iter().map(|z| -*z));
        let prod_p = product(self.poles.iter().map(|p| -*p));
        Self {
            zeros,
            poles: self.poles.iter().map(|p| wo / *p).collect(),
            gain: self.gain * (prod_z / prod_p).re,
        }
    }

    fn to_bandpass(&self, wo: f64, bw: f64) -> Self {
        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let scaled: Vec<Complex64> = roots.iter().map(|r| *r * (bw / 2.0)).collect();
            let offsets: Vec<Complex64> = scaled
                .iter()
                .map(|r| (*r * *r - wo * wo).sqrt())
                .collect();
            scaled
                .iter()
                .zip(&offsets)
                .map(|(r, d)| *r + *d)
                .chain(scaled.iter().zip(&offsets).map(|(r, d)| *r - *d))
                .collect()
        };

        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(self.degree()));
        Self {
            zeros,
            poles: split(&self.poles),
            gain: self.gain * bw.powi(self.degree() as i32),
        }
    }

    fn bilinear(&self) -> Self {
        let map = |r: &Complex64| (BILINEAR_K + *r) / (BILINEAR_K - *r);

        let mut zeros: Vec<Complex64> = self.zeros.iter().map(map).collect();
        zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(self.degree()));

        let prod_z = product(self.zeros.iter().map(|z| BILINEAR_K - *z));
        let prod_p = product(self.poles.iter().map(|p| BILINEAR_K - *p));
        Self {
            zeros,
            poles: self.poles.iter().map(map).collect(),
            gain: self.gain * (prod_z / prod_p).re,
        }
    }

    /// Group conjugate pole pairs with their nearest zeros into biquads
    ///
    /// Sections are ordered by increasing pole radius, so the poles closest
    /// to the unit circle come last. The overall gain goes into the first
    /// section.
    fn to_sections(&self) -> DspResult<Vec<SecondOrderSection>> {
        let mut pairs: Vec<(Complex64, Option<Complex64>)> = self
            .poles
            .iter()
            .filter(|p| p.im > IMAG_EPS)
            .map(|p| (*p, Some(p.conj())))
            .collect();

        let mut real_poles: Vec<f64> = self
            .poles
            .iter()
            .filter(|p| p.im.abs() <= IMAG_EPS)
            .map(|p| p.re)
            .collect();
        real_poles.sort_by(|x, y| x.total_cmp(y));
        pairs.extend(real_poles.chunks(2).map(|chunk| {
            (
                Complex64::new(chunk[0], 0.0),
                chunk.get(1).map(|&p| Complex64::new(p, 0.0)),
            )
        }));
        pairs.sort_by(|x, y| x.0.norm().total_cmp(&y.0.norm()));

        let mut zeros = self.zeros.clone();
        let mut sections = Vec::with_capacity(pairs.len());
        for (p1, p2) in pairs {
            let z1 = take_nearest(&mut zeros, p1, false);
            let z2 = match z1 {
                Some(z) if z.im.abs() > IMAG_EPS => take_nearest(&mut zeros, z.conj(), false),
                _ => take_nearest(&mut zeros, p1, true),
            };
            sections.push(SecondOrderSection::new(
                quadratic(z1, z2),
                quadratic(Some(p1), p2),
            )?);
        }

        if let Some(first) = sections.first_mut() {
            let [b0, b1, b2] = *first.b();
            *first = SecondOrderSection::new(
                [b0 * self.gain, b1 * self.gain, b2 * self.gain],
                *first.a(),
            )?;
        }
        Ok(sections)
    }
}

/// Imaginary parts below this count as real roots
const IMAG_EPS: f64 = 1e-10;

/// Remove and return the root closest to `target`
fn take_nearest(
    roots: &mut Vec<Complex64>,
    target: Complex64,
    real_only: bool,
) -> Option<Complex64> {
    let distance = |r: &Complex64| (*r - target).norm();
    let index = roots
        .iter()
        .enumerate()
        .filter(|(_, r)| !real_only || r.im.abs() <= IMAG_EPS)
        .min_by(|(_, x), (_, y)| distance(x).total_cmp(&distance(y)))
        .map(|(i, _)| i)?;
    Some(roots.swap_remove(index))
}

/// Taps of `(1 - r1 z^-1)(1 - r2 z^-1)`; a missing root contributes nothing
fn quadratic(r1: Option<Complex64>, r2: Option<Complex64>) -> [f64; 3] {
    let zero = Complex64::new(0.0, 0.0);
    let (r1, r2) = (r1.unwrap_or(zero), r2.unwrap_or(zero));
    [1.0, -(r1 + r2).re, (r1 * r2).re]
}

fn product(values: impl Iterator<Item = Complex64>) -> Complex64 {
    values.fold(Complex64::new(1.0, 0.0), |acc, v| acc * v)
}
