//! WAV codec backed by `hound`.

use crate::audio::clip::{AudioClip, resample};
use crate::audio::codec::AudioCodec;
use crate::defaults::SAMPLE_RATE;
use crate::error::{LexvoxError, Result};
use std::io::Cursor;

/// 16-bit mono PCM WAV at a fixed sample rate.
///
/// Decoding accepts any sample rate and mono or stereo input, downmixing and
/// resampling to the codec rate.
#[derive(Debug, Clone, Copy)]
pub struct WavCodec {
    sample_rate: u32,
}

impl WavCodec {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl Default for WavCodec {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

impl AudioCodec for WavCodec {
    fn extension(&self) -> &str {
        "wav"
    }

    fn decode(&self, bytes: &[u8]) -> Result<AudioClip> {
        let mut reader =
            hound::WavReader::new(Cursor::new(bytes)).map_err(|e| LexvoxError::AudioDecode {
                message: format!("Failed to parse WAV data: {}", e),
            })?;

        let spec = reader.spec();

        let raw_samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LexvoxError::AudioDecode {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        let mono_samples = if spec.channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        Ok(AudioClip::new(
            resample(&mono_samples, spec.sample_rate, self.sample_rate),
            self.sample_rate,
        ))
    }

    fn encode(&self, clip: &AudioClip) -> Result<Vec<u8>> {
        let samples = resample(&clip.samples, clip.sample_rate, self.sample_rate);
        let mut cursor = Cursor::new(Vec::new());
        let encode_err = |e: hound::Error| LexvoxError::AudioEncode {
            message: format!("Failed to encode WAV: {}", e),
        };

        let mut writer = hound::WavWriter::new(&mut cursor, self.spec()).map_err(encode_err)?;
        for sample in samples {
            writer.write_sample(sample).map_err(encode_err)?;
        }
        writer.finalize().map_err(encode_err)?;

        Ok(cursor.into_inner())
    }
}
