//! MP3 codec: `symphonia` for decoding, LAME for encoding.

use crate::audio::clip::{AudioClip, resample};
use crate::audio::codec::AudioCodec;
use crate::defaults::SAMPLE_RATE;
use crate::error::{LexvoxError, Result};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};
use std::borrow::Cow;
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Mono MP3 at 192 kbps and a fixed sample rate.
///
/// Decoding detects the container, so WAV service output is accepted as
/// well. Decoded audio is downmixed and resampled to the codec
/// rate. The encoder needs an MPEG-1 rate (32, 44.1 or 48 kHz) for 192 kbps.
#[derive(Debug, Clone, Copy)]
pub struct Mp3Codec {
    sample_rate: u32,
}

impl Mp3Codec {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Default for Mp3Codec {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

impl AudioCodec for Mp3Codec {
    fn extension(&self) -> &str {
        "mp3"
    }

    fn decode(&self, bytes: &[u8]) -> Result<AudioClip> {
        Ok(decode_any(bytes)?.resampled(self.sample_rate))
    }

    fn encode(&self, clip: &AudioClip) -> Result<Vec<u8>> {
        let samples = resample(&clip.samples, clip.sample_rate, self.sample_rate);
        let encode_err = |stage: &str, e: &dyn std::fmt::Debug| LexvoxError::AudioEncode {
            message: format!("LAME {stage} failed: {e:?}"),
        };

        let mut builder = Builder::new().ok_or_else(|| LexvoxError::AudioEncode {
            message: "failed to allocate LAME encoder".to_string(),
        })?;
        builder
            .set_num_channels(1)
            .map_err(|e| encode_err("channels", &e))?;
        builder
            .set_sample_rate(self.sample_rate)
            .map_err(|e| encode_err("sample rate", &e))?;
        builder
            .set_brate(Bitrate::Kbps192)
            .map_err(|e| encode_err("bitrate", &e))?;
        builder
            .set_quality(Quality::Best)
            .map_err(|e| encode_err("quality", &e))?;
        let mut encoder = builder.build().map_err(|e| encode_err("init", &e))?;

        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples.len()));
        encoder
            .encode_to_vec(MonoPcm(samples.as_slice()), &mut out)
            .map_err(|e| encode_err("encode", &e))?;
        encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| encode_err("flush", &e))?;

        Ok(out)
    }
}

/// Decode any container and codec symphonia recognizes into a mono clip at
/// the stream's own sample rate.
pub fn decode_any(bytes: &[u8]) -> Result<AudioClip> {
    let decode_err = |message: String| LexvoxError::AudioDecode { message };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut format = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(format!("Unrecognized audio data: {e}")))?
        .format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("No audio track found".to_string()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("Unsupported codec: {e}")))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(format!("Failed to read packet: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(buffer) => {
                sample_rate.get_or_insert(buffer.spec().rate);
                append_mono(&mut samples, buffer);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(error = e, "skipping undecodable packet");
            }
            Err(e) => return Err(decode_err(format!("Failed to decode packet: {e}"))),
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| decode_err("Stream has no sample rate".to_string()))?;
    Ok(AudioClip::new(samples, sample_rate))
}

fn append_mono(samples: &mut Vec<i16>, buffer: AudioBufferRef<'_>) {
    match buffer {
        AudioBufferRef::U8(data) => downmix(samples, data),
        AudioBufferRef::U16(data) => downmix(samples, data),
        AudioBufferRef::U24(data) => downmix(samples, data),
        AudioBufferRef::U32(data) => downmix(samples, data),
        AudioBufferRef::S8(data) => downmix(samples, data),
        AudioBufferRef::S16(data) => downmix(samples, data),
        AudioBufferRef::S24(data) => downmix(samples, data),
        AudioBufferRef::S32(data) => downmix(samples, data),
        AudioBufferRef::F32(data) => downmix(samples, data),
        AudioBufferRef::F64(data) => downmix(samples, data),
    }
}

fn downmix<T>(samples: &mut Vec<i16>, data: Cow<'_, AudioBuffer<T>>)
where
    T: Sample,
    i16: FromSample<T>,
{
    let channels = data.spec().channels.count().max(1);
    for frame in 0..data.frames() {
        let sum: i32 = (0..channels)
            .map(|ch| i32::from(i16::from_sample(data.chan(ch)[frame])))
            .sum();
        samples.push((sum / channels as i32) as i16);
    }
}
