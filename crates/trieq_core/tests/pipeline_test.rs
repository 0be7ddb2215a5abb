//! End-to-end equalizer tests
//!
//! Run with: cargo test -p trieq_core --test pipeline_test

use std::sync::Once;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trieq_core::{
    equalize, equalize_samples, AudioBuffer, Band, DspError, EqSettings, Equalizer, ErrorKind,
    GainSpec, ProcessingMode,
};
use trieq_dsp::spectrum::{energy_ratio_db, SpectrumAnalyzer};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

const SAMPLE_RATE: u32 = 44100;

/// Sum of sines, `(frequency, amplitude)` per component
fn tones(components: &[(f64, f64)], len: usize, sample_rate: u32) -> AudioBuffer {
    let samples = (0..len)
        .map(|i| {
            let t = i as f64 / f64::from(sample_rate);
            components
                .iter()
                .map(|(freq, amp)| amp * (2.0 * std::f64::consts::PI * freq * t).sin())
                .sum::<f64>() as f32
        })
        .collect();
    AudioBuffer::new(samples, sample_rate)
}

/// Raised-cosine fade in and out over `fade_len` samples
fn faded(buffer: &AudioBuffer, fade_len: usize) -> AudioBuffer {
    let len = buffer.len();
    let samples = buffer
        .samples()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let edge = i.min(len - 1 - i);
            if edge >= fade_len {
                *s
            } else {
                let phase = std::f64::consts::PI * edge as f64 / fade_len as f64;
                s * (0.5 * (1.0 - phase.cos())) as f32
            }
        })
        .collect();
    AudioBuffer::new(samples, buffer.sample_rate())
}

/// Middle 80% of a buffer, clear of filter edge transients
fn middle(buffer: &AudioBuffer) -> AudioBuffer {
    let margin = buffer.len() / 10;
    AudioBuffer::new(
        buffer.samples()[margin..buffer.len() - margin].to_vec(),
        buffer.sample_rate(),
    )
}

/// Relative energy of `output - input`, in dB
fn reconstruction_error_db(input: &AudioBuffer, output: &AudioBuffer) -> f64 {
    let signal: f64 = input.samples().iter().map(|s| f64::from(*s).powi(2)).sum();
    let error: f64 = input
        .samples()
        .iter()
        .zip(output.samples())
        .map(|(a, b)| (f64::from(*a) - f64::from(*b)).powi(2))
        .sum();
    10.0 * (error / signal).log10()
}

fn band_change_db(before: &AudioBuffer, after: &AudioBuffer, low_hz: f64, high_hz: f64) -> f64 {
    let before = middle(before);
    let after = middle(after);
    let analyzer = SpectrumAnalyzer::new(before.len());
    energy_ratio_db(
        analyzer.band_energy(&after, low_hz, high_hz),
        analyzer.band_energy(&before, low_hz, high_hz),
    )
}

#[test]
fn test_flat_gains_reconstruct_tones_away_from_crossovers() {
    init_tracing();
    let input = faded(
        &tones(
            &[(100.0, 0.25), (1000.0, 0.25), (10000.0, 0.25)],
            SAMPLE_RATE as usize,
            SAMPLE_RATE,
        ),
        SAMPLE_RATE as usize / 20,
    );

    let output = equalize(&input, &GainSpec::flat()).unwrap();

    let error_db = reconstruction_error_db(&input, &output);
    assert!(error_db <= -40.0, "reconstruction error {:.1} dB", error_db);
}

#[test]
fn test_flat_gains_bound_for_broadband_input() {
    init_tracing();
    // The squared band responses do not sum to one near the crossovers, so
    // broadband and near-crossover content reconstructs to about -28..-31 dB
    let mut rng = StdRng::seed_from_u64(7);
    let tonal = tones(
        &[(350.0, 0.25), (3000.0, 0.25)],
        SAMPLE_RATE as usize,
        SAMPLE_RATE,
    );
    let noisy = AudioBuffer::new(
        tonal
            .samples()
            .iter()
            .map(|s| s + rng.gen_range(-0.3f32..0.3))
            .collect(),
        SAMPLE_RATE,
    );

    for input in [
        noisy,
        tones(&[(350.0, 0.5)], SAMPLE_RATE as usize, SAMPLE_RATE),
        tones(&[(3000.0, 0.5)], SAMPLE_RATE as usize, SAMPLE_RATE),
    ] {
        let output = equalize(&input, &GainSpec::flat()).unwrap();
        let error_db = reconstruction_error_db(&input, &output);
        assert!(error_db <= -25.0, "reconstruction error {:.1} dB", error_db);
    }
}

#[test]
fn test_cut_low_and_high_keeps_mid() {
    init_tracing();
    let input = tones(
        &[(60.0, 0.3), (1000.0, 0.3), (10000.0, 0.3)],
        SAMPLE_RATE as usize,
        SAMPLE_RATE,
    );

    let output = equalize(&input, &GainSpec::new(-12.0, 0.0, -12.0)).unwrap();

    let low = band_change_db(&input, &output, 40.0, 80.0);
    let mid = band_change_db(&input, &output, 900.0, 1100.0);
    let high = band_change_db(&input, &output, 9000.0, 11000.0);
    assert!((low + 12.0).abs() < 0.5, "60 Hz changed by {:.2} dB", low);
    assert!(mid.abs() < 0.5, "1 kHz changed by {:.2} dB", mid);
    assert!((high + 12.0).abs() < 0.5, "10 kHz changed by {:.2} dB", high);
}

#[test]
fn test_low_gain_is_monotonic() {
    init_tracing();
    // Quiet enough that +12 dB never triggers normalization
    let input = tones(&[(60.0, 0.05), (1000.0, 0.05)], SAMPLE_RATE as usize, SAMPLE_RATE);

    let changes: Vec<f64> = [0.0, 6.0, 12.0]
        .iter()
        .map(|&gain| {
            let output = equalize(&input, &GainSpec::new(gain, 0.0, 0.0)).unwrap();
            assert!(output.peak() < 1.0);
            band_change_db(&input, &output, 40.0, 80.0)
        })
        .collect();

    assert!(changes[0] < changes[1] && changes[1] < changes[2]);
    assert!((changes[1] - 6.0).abs() < 0.5);
    assert!((changes[2] - 12.0).abs() < 0.5);
}

#[test]
fn test_boost_is_normalized_to_full_scale() {
    init_tracing();
    let input = tones(&[(440.0, 0.9)], 8000, SAMPLE_RATE);

    let output = equalize(&input, &GainSpec::new(12.0, 12.0, 12.0)).unwrap();

    assert_eq!(output.len(), input.len());
    assert_eq!(output.peak(), 1.0);
    assert!(output.samples().iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn test_silence_stays_silent() {
    init_tracing();
    let input = AudioBuffer::silence(2048, SAMPLE_RATE);
    let output = equalize(&input, &GainSpec::new(12.0, -12.0, 6.0)).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_low_sample_rate_clamps_crossovers() {
    init_tracing();
    let input = tones(&[(300.0, 0.5)], 4000, 4000);
    let output = equalize(&input, &GainSpec::new(3.0, 3.0, 3.0)).unwrap();
    assert_eq!(output.len(), 4000);
    assert_eq!(output.sample_rate(), 4000);
    assert!(output.is_finite());
}

#[test]
fn test_sample_rate_too_low_for_bands() {
    init_tracing();
    let input = tones(&[(50.0, 0.5)], 1000, 500);
    let err = equalize(&input, &GainSpec::flat()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_five_samples_rejected() {
    init_tracing();
    let err =
        equalize_samples(&[0.1, 0.2, 0.3, 0.2, 0.1], SAMPLE_RATE, 0.0, 0.0, 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientSamples);
    assert!(matches!(err, DspError::InsufficientSamples { actual: 5, .. }));
}

#[test]
fn test_modes_are_bit_identical() {
    init_tracing();
    let input = tones(&[(80.0, 0.4), (2500.0, 0.3), (7000.0, 0.2)], 20000, 48000);
    let gains = GainSpec::new(9.0, -4.5, 7.0);

    let parallel = Equalizer::new(EqSettings::new(gains).with_mode(ProcessingMode::Parallel))
        .process(&input)
        .unwrap();
    let sequential = Equalizer::new(EqSettings::new(gains).with_mode(ProcessingMode::Sequential))
        .process(&input)
        .unwrap();

    assert_eq!(parallel.samples(), sequential.samples());
}

#[test]
fn test_stereo_channels_independent() {
    init_tracing();
    let left = tones(&[(100.0, 0.5)], 10000, SAMPLE_RATE);
    let right = tones(&[(8000.0, 0.5)], 10000, SAMPLE_RATE);
    let eq = Equalizer::new(EqSettings::new(GainSpec::new(-12.0, 0.0, 0.0)));

    let outputs = eq.process_channels(&[left.clone(), right.clone()]).unwrap();

    // Cutting the low band must not touch the treble-only channel
    assert!(band_change_db(&left, &outputs[0], 80.0, 120.0) < -10.0);
    assert!(band_change_db(&right, &outputs[1], 7500.0, 8500.0).abs() < 0.5);
}

#[test]
fn test_error_carries_band_context() {
    init_tracing();
    let input = tones(&[(1000.0, 0.5)], 2000, SAMPLE_RATE);
    let err = equalize(&input, &GainSpec::new(0.0, 0.0, 1000.0)).unwrap_err();
    assert_eq!(err.band(), Some(Band::High));
    assert_eq!(err.kind(), ErrorKind::NumericOverflow);
}
