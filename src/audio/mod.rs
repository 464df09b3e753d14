//! Audio clips and the codecs used for the on-disk audio cache.

pub mod clip;
pub mod codec;
pub mod format;
pub mod mp3;
pub mod wav;

pub use clip::AudioClip;
pub use codec::AudioCodec;
pub use format::AudioFormat;
pub use mp3::Mp3Codec;
pub use wav::WavCodec;
