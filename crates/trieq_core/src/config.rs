//! Equalizer Settings

use serde::{Deserialize, Serialize};
use trieq_dsp::{find_preset, Band};

use crate::error::{EngineError, EngineResult};

/// Lowest gain offered by the UI sliders (dB)
pub const UI_GAIN_MIN_DB: f32 = -12.0;

/// Highest gain offered by the UI sliders (dB)
pub const UI_GAIN_MAX_DB: f32 = 12.0;

/// UI slider resolution (dB)
pub const UI_GAIN_STEP_DB: f32 = 0.1;

/// Per-band gains in decibels
///
/// The core applies any finite value; the ±12 dB slider range is only
/// enforced by [`clamped_to_ui_range`](Self::clamped_to_ui_range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainSpec {
    pub low_db: f32,
    pub mid_db: f32,
    pub high_db: f32,
}

impl Default for GainSpec {
    fn default() -> Self {
        Self::flat()
    }
}

impl GainSpec {
    pub fn new(low_db: f32, mid_db: f32, high_db: f32) -> Self {
        Self {
            low_db,
            mid_db,
            high_db,
        }
    }

    /// All bands at 0 dB (the "reset" state)
    pub fn flat() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Gains of a built-in preset, looked up by name
    pub fn from_preset(name: &str) -> Option<Self> {
        find_preset(name).map(Self::from)
    }

    pub fn for_band(&self, band: Band) -> f32 {
        match band {
            Band::Low => self.low_db,
            Band::Mid => self.mid_db,
            Band::High => self.high_db,
        }
    }

    pub fn set_band(&mut self, band: Band, gain_db: f32) {
        match band {
            Band::Low => self.low_db = gain_db,
            Band::Mid => self.mid_db = gain_db,
            Band::High => self.high_db = gain_db,
        }
    }

    /// Gains clamped to the slider range and rounded to its step
    pub fn clamped_to_ui_range(&self) -> Self {
        let snap = |db: f32| {
            let stepped = (db / UI_GAIN_STEP_DB).round() * UI_GAIN_STEP_DB;
            stepped.clamp(UI_GAIN_MIN_DB, UI_GAIN_MAX_DB)
        };
        Self::new(snap(self.low_db), snap(self.mid_db), snap(self.high_db))
    }

    pub fn is_flat(&self) -> bool {
        Band::ALL.iter().all(|&band| self.for_band(band) == 0.0)
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.low_db, self.mid_db, self.high_db]
    }
}

impl From<[f32; 3]> for GainSpec {
    fn from(gains: [f32; 3]) -> Self {
        Self::new(gains[0], gains[1], gains[2])
    }
}

/// How the three band filters are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Bands run as independent tasks on the rayon pool
    #[default]
    Parallel,
    /// Bands run one after another on the calling thread
    Sequential,
}

/// Complete equalizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EqSettings {
    pub gains: GainSpec,
    #[serde(default)]
    pub mode: ProcessingMode,
}

impl EqSettings {
    pub fn new(gains: GainSpec) -> Self {
        Self {
            gains,
            mode: ProcessingMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate configuration
    ///
    /// Gains must be finite; their range is not restricted.
    pub fn validate(&self) -> EngineResult<()> {
        for band in Band::ALL {
            let gain = self.gains.for_band(band);
            if !gain.is_finite() {
                return Err(EngineError::InvalidSettings(format!(
                    "{} gain must be finite, got {}",
                    band, gain
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
