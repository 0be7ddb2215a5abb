//! Zero-Phase (Forward-Backward) Filtering
//!
//! Runs a filter over the buffer, then over the time-reversed result, so the
//! phase shifts of the two passes cancel and the magnitude response is
//! squared. This needs the whole buffer up front and cannot run on a stream.
//!
//! Edge transients are reduced two ways:
//! - the signal is extended at both ends by an odd (point-symmetric)
//!   reflection of `padlen` samples, trimmed off afterwards
//! - each pass starts from the filter's steady state for a constant input
//!   equal to the first sample of that pass
//!
//! Each pass runs the second-order sections one after another. Section `k`
//! starts from its own steady state scaled by the DC gain of sections
//! `0..k`, so the whole cascade is settled on the first sample.

use crate::buffer::AudioBuffer;
use crate::design::{FilterCoefficients, SecondOrderSection};
use crate::error::{DspError, DspResult, Stage};

/// Applies one filter with zero net phase shift
#[derive(Debug, Clone)]
pub struct ZeroPhaseFilter<'a> {
    coefficients: &'a FilterCoefficients,
}

impl<'a> ZeroPhaseFilter<'a> {
    pub fn new(coefficients: &'a FilterCoefficients) -> Self {
        Self { coefficients }
    }

    /// Samples reflected at each edge: three times the tap count of the
    /// equivalent single transfer function
    pub fn padlen(&self) -> usize {
        3 * self.coefficients.ntaps()
    }

    /// Shortest buffer this filter accepts
    pub fn min_len(&self) -> usize {
        self.padlen() + 1
    }

    /// Filter `input` forward and backward into a new buffer
    ///
    /// Fails with [`DspError::InsufficientSamples`] if the buffer is not longer
    /// than [`padlen`](Self::padlen), and with [`DspError::NumericOverflow`] if
    /// any output sample is non-finite.
    pub fn apply(&self, input: &AudioBuffer) -> DspResult<AudioBuffer> {
        let padlen = self.padlen();
        if input.len() <= padlen {
            return Err(DspError::InsufficientSamples {
                band: None,
                required: padlen,
                actual: input.len(),
            });
        }

        let sections = self.coefficients.sections();
        let zi = cascade_steady_state(sections);

        let mut signal = odd_extend(input.samples(), padlen);
        run_cascade(sections, &zi, &mut signal);
        signal.reverse();
        run_cascade(sections, &zi, &mut signal);
        signal.reverse();

        let output: Vec<f32> = signal[padlen..signal.len() - padlen]
            .iter()
            .map(|&s| s as f32)
            .collect();

        if !output.iter().all(|s| s.is_finite()) {
            return Err(DspError::NumericOverflow {
                band: None,
                stage: Stage::Filter,
            });
        }
        Ok(input.with_samples(output))
    }
}

/// Extend `x` by `n` point-reflected samples at each end
///
/// Left: `2*x[0] - x[n..=1]`, right: `2*x[last] - x[last-1..=last-n]`.
/// Requires `x.len() > n`.
fn odd_extend(x: &[f32], n: usize) -> Vec<f64> {
    let len = x.len();
    let first = f64::from(x[0]);
    let last = f64::from(x[len - 1]);

    let mut out = Vec::with_capacity(len + 2 * n);
    out.extend((1..=n).rev().map(|i| 2.0 * first - f64::from(x[i])));
    out.extend(x.iter().map(|&s| f64::from(s)));
    out.extend((2..n + 2).map(|i| 2.0 * last - f64::from(x[len - i])));
    out
}

/// Initial delay-line state giving the steady-state step response
///
/// Solves `zi = A*zi + B` for the transposed direct form II state, using the
/// closed form available for a companion matrix.
fn steady_state(b: &[f64], a: &[f64]) -> Vec<f64> {
    let n = b.len().max(a.len());
    if n < 2 {
        return Vec::new();
    }
    let b = padded(b, n);
    let a = padded(a, n);

    let mut zi = vec![0.0; n - 1];
    let b_sum: f64 = (1..n).map(|k| b[k] - a[k] * b[0]).sum();
    let a_sum: f64 = a.iter().sum();
    zi[0] = b_sum / a_sum;

    let mut asum = 1.0;
    let mut csum = 0.0;
    for k in 1..n - 1 {
        asum += a[k];
        csum += b[k] - a[k] * b[0];
        zi[k] = asum * zi[0] - csum;
    }
    zi
}

/// Steady state of every section for a unit step into the cascade
fn cascade_steady_state(sections: &[SecondOrderSection]) -> Vec<Vec<f64>> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|section| {
            let zi = scaled(&steady_state(section.b(), section.a()), scale);
            scale *= section.dc_gain();
            zi
        })
        .collect()
}

/// Filter `signal` in place through every section, settled on `signal[0]`
fn run_cascade(sections: &[SecondOrderSection], zi: &[Vec<f64>], signal: &mut [f64]) {
    let Some(&x0) = signal.first() else {
        return;
    };
    for (section, state) in sections.iter().zip(zi) {
        lfilter(section.b(), section.a(), signal, &scaled(state, x0));
    }
}

fn padded(taps: &[f64], n: usize) -> Vec<f64> {
    let mut out = taps.to_vec();
    out.resize(n, 0.0);
    out
}

fn scaled(zi: &[f64], factor: f64) -> Vec<f64> {
    zi.iter().map(|z| z * factor).collect()
}

/// In-place transposed direct form II filter with `a[0] == 1`
fn lfilter(b: &[f64], a: &[f64], signal: &mut [f64], zi: &[f64]) {
    let n = b.len().max(a.len());
    let b = padded(b, n);
    let a = padded(a, n);
    let mut z = zi.to_vec();
    z.resize(n - 1, 0.0);

    for sample in signal.iter_mut() {
        let x = *sample;
        let y = b[0] * x + z.first().copied().unwrap_or(0.0);
        for k in 0..n.saturating_sub(1) {
            let next = if k + 1 < n - 1 { z[k + 1] } else { 0.0 };
            z[k] = b[k + 1] * x + next - a[k + 1] * y;
        }
        *sample = y;
    }
}
