//! Trieq Core - Equalizer Pipeline
//!
//! This crate provides the offline three-band equalizer built on `trieq_dsp`:
//! - Gain settings with presets, UI clamping and JSON persistence
//! - The band-split / gain / mix / normalize pipeline
//! - Parallel band processing on the rayon pool
//! - Decoder and encoder interfaces for container collaborators
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      ┌──────────────────────────────────────┐      ┌──────────────┐
//! │ AudioDecoder │─────▶│              Equalizer               │─────▶│ AudioEncoder │
//! └──────────────┘      │  design ─▶ {Low, Mid, High} ─▶ mix   │      └──────────────┘
//!                       │            (rayon tasks)      │      │
//!                       │                           normalize  │
//!                       └──────────────────────────────────────┘
//! ```

mod codec;
mod config;
mod error;
mod pipeline;

pub use codec::{render, AudioDecoder, AudioEncoder, DecodedAudio};
pub use config::{
    EqSettings, GainSpec, ProcessingMode, UI_GAIN_MAX_DB, UI_GAIN_MIN_DB, UI_GAIN_STEP_DB,
};
pub use error::{EngineError, EngineResult};
pub use pipeline::{equalize, equalize_samples, Equalizer, EqualizerResult};

// Re-export DSP types for convenience
pub use trieq_dsp::{AudioBuffer, Band, DspError, ErrorKind, Stage, PRESETS};
