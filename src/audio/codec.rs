//! Audio codec capability used by the synthesis cache and batch assembler.

use crate::audio::clip::AudioClip;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Trait for decoding service/cache audio and encoding clips for export.
///
/// Encoded output always uses the codec's fixed format, so everything written
/// to the audio cache shares one sample rate and bit depth.
pub trait AudioCodec: Send + Sync {
    /// File extension (without dot) of encoded files.
    fn extension(&self) -> &str;

    /// Decode encoded audio bytes into a clip.
    fn decode(&self, bytes: &[u8]) -> Result<AudioClip>;

    /// Encode a clip in the codec's fixed output format.
    fn encode(&self, clip: &AudioClip) -> Result<Vec<u8>>;

    /// Load and decode an audio file.
    fn load(&self, path: &Path) -> Result<AudioClip> {
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }
}

impl<T: AudioCodec + ?Sized> AudioCodec for Arc<T> {
    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn decode(&self, bytes: &[u8]) -> Result<AudioClip> {
        (**self).decode(bytes)
    }

    fn encode(&self, clip: &AudioClip) -> Result<Vec<u8>> {
        (**self).encode(clip)
    }

    fn load(&self, path: &Path) -> Result<AudioClip> {
        (**self).load(path)
    }
}
