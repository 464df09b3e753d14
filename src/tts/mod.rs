//! Speech synthesis capability and voice profiles.

#[cfg(feature = "azure")]
pub mod azure;
pub mod synthesizer;
pub mod voice;

pub use synthesizer::{MockSynthesizer, Synthesizer};
pub use voice::{VoiceProfile, default_voices, select_voices};
