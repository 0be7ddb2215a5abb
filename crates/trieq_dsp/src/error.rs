//! DSP Error Types

use std::fmt;

use thiserror::Error;

use crate::band::Band;

/// Processing stage where an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Design,
    Filter,
    Gain,
    Mix,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Design => "filter design",
            Stage::Filter => "zero-phase filtering",
            Stage::Gain => "gain stage",
            Stage::Mix => "mixer",
        };
        f.write_str(name)
    }
}

/// Coarse error category, for callers that only branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InsufficientSamples,
    NumericOverflow,
}

/// Errors that can occur during DSP operations
///
/// None of these are retryable with the same input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Configuration error in {stage}: {reason}")]
    Configuration { stage: Stage, reason: String },

    #[error(
        "Insufficient samples{}: zero-phase filtering needs more than {required}, got {actual}",
        band_suffix(.band)
    )]
    InsufficientSamples {
        band: Option<Band>,
        required: usize,
        actual: usize,
    },

    #[error("Non-finite sample produced in {stage}{}", band_suffix(.band))]
    NumericOverflow { band: Option<Band>, stage: Stage },
}

fn band_suffix(band: &Option<Band>) -> String {
    match band {
        Some(band) => format!(" ({} band)", band),
        None => String::new(),
    }
}

impl DspError {
    pub(crate) fn config(stage: Stage, reason: impl Into<String>) -> Self {
        DspError::Configuration {
            stage,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DspError::Configuration { .. } => ErrorKind::Configuration,
            DspError::InsufficientSamples { .. } => ErrorKind::InsufficientSamples,
            DspError::NumericOverflow { .. } => ErrorKind::NumericOverflow,
        }
    }

    /// Band the error is attributed to, if any
    pub fn band(&self) -> Option<Band> {
        match self {
            DspError::Configuration { .. } => None,
            DspError::InsufficientSamples { band, .. } | DspError::NumericOverflow { band, .. } => {
                *band
            }
        }
    }

    /// Attach band context to an error raised by a band-agnostic stage
    pub fn in_band(self, band: Band) -> Self {
        match self {
            DspError::InsufficientSamples {
                required, actual, ..
            } => DspError::InsufficientSamples {
                band: Some(band),
                required,
                actual,
            },
            DspError::NumericOverflow { stage, .. } => DspError::NumericOverflow {
                band: Some(band),
                stage,
            },
            other => other,
        }
    }
}

/// Result type alias for DSP operations
pub type DspResult<T> = Result<T, DspError>;
