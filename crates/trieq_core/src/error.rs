//! Engine Error Types

use thiserror::Error;

/// Errors that can occur around the equalizer pipeline
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("DSP error: {0}")]
    DspError(#[from] trieq_dsp::DspError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Settings could not be parsed: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Decoder error: {0}")]
    Decode(String),

    #[error("Encoder error: {0}")]
    Encode(String),

    #[error("Decoded audio has no channels")]
    NoChannels,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
