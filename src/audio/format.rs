//! File format of the audio cache.

use crate::audio::codec::AudioCodec;
use crate::audio::mp3::Mp3Codec;
use crate::audio::wav::WavCodec;
use crate::defaults::{MP3_OUTPUT_FORMAT, WAV_OUTPUT_FORMAT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Encoding of every file written under the audio directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 192 kbps mono MP3, the layout older runs left behind.
    #[default]
    Mp3,
    /// 16-bit mono PCM WAV.
    Wav,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    /// Codec writing this format at `sample_rate`.
    pub fn codec(self, sample_rate: u32) -> Arc<dyn AudioCodec> {
        match self {
            AudioFormat::Mp3 => Arc::new(Mp3Codec::new(sample_rate)),
            AudioFormat::Wav => Arc::new(WavCodec::new(sample_rate)),
        }
    }

    /// Synthesis service output format that needs no transcoding before
    /// decode.
    pub fn service_output_format(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => MP3_OUTPUT_FORMAT,
            AudioFormat::Wav => WAV_OUTPUT_FORMAT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_extension_matches_format() {
        for format in [AudioFormat::Mp3, AudioFormat::Wav] {
            assert_eq!(format.codec(48_000).extension(), format.extension());
        }
    }

    #[test]
    fn mp3_is_the_default() {
        assert_eq!(AudioFormat::default(), AudioFormat::Mp3);
        assert_eq!(
            AudioFormat::default().service_output_format(),
            "audio-48khz-192kbitrate-mono-mp3"
        );
    }
}
