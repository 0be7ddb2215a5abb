//! Decoder / Encoder Interfaces
//!
//! Container formats live outside this crate. Collaborators implement
//! [`AudioDecoder`] and [`AudioEncoder`]; [`render`] wires them to the
//! equalizer.

use tracing::{debug, info};
use trieq_dsp::AudioBuffer;

use crate::config::EqSettings;
use crate::error::{EngineError, EngineResult};
use crate::pipeline::Equalizer;

/// Planar audio as produced by a decoder
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// One sample vector per channel, all at `sample_rate`
    pub channels: Vec<Vec<f32>>,

    /// Samples per second
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn to_buffers(&self) -> Vec<AudioBuffer> {
        self.channels
            .iter()
            .map(|samples| AudioBuffer::new(samples.clone(), self.sample_rate))
            .collect()
    }
}

/// Source of decoded audio (e.g. a WAV or MP3 reader)
pub trait AudioDecoder {
    /// Decode the whole source into memory
    fn decode(&mut self) -> EngineResult<DecodedAudio>;
}

/// Sink for processed audio
pub trait AudioEncoder {
    /// Write all channels to the destination
    fn encode(&mut self, audio: &DecodedAudio) -> EngineResult<()>;
}

/// Decode, equalize every channel, and encode
///
/// The encoder is only called once every channel has been processed
/// successfully.
pub fn render<D, E>(decoder: &mut D, encoder: &mut E, settings: &EqSettings) -> EngineResult<()>
where
    D: AudioDecoder + ?Sized,
    E: AudioEncoder + ?Sized,
{
    settings.validate()?;

    let decoded = decoder.decode()?;
    if decoded.channels.is_empty() {
        return Err(EngineError::NoChannels);
    }
    debug!(
        "Decoded {} channel(s) at {}Hz",
        decoded.channel_count(),
        decoded.sample_rate
    );

    let equalizer = Equalizer::new(*settings);
    let processed = equalizer.process_channels(&decoded.to_buffers())?;

    let output = DecodedAudio::new(
        processed.into_iter().map(AudioBuffer::into_samples).collect(),
        decoded.sample_rate,
    );
    encoder.encode(&output)?;

    info!(
        "Rendered {} channel(s) of {} samples",
        output.channel_count(),
        output.channels.first().map_or(0, Vec::len)
    );
    Ok(())
}
