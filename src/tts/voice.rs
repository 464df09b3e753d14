//! Voice profiles: named synthesis configurations with their own audio tree.

use crate::defaults::VOICES;
use serde::{Deserialize, Serialize};

/// A named voice bound to a synthesis service voice id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Profile name, used as the audio directory segment (e.g. "male").
    pub name: String,
    /// Service voice identifier (e.g. "zh-HK-WanLungNeural").
    pub voice: String,
}

impl VoiceProfile {
    pub fn new(name: &str, voice: &str) -> Self {
        Self {
            name: name.to_string(),
            voice: voice.to_string(),
        }
    }
}

/// The built-in `male`/`female` profiles.
pub fn default_voices() -> Vec<VoiceProfile> {
    VOICES
        .iter()
        .map(|(name, voice)| VoiceProfile::new(name, voice))
        .collect()
}

/// Keep only the profiles named in `names`, preserving configuration order.
///
/// An empty selection keeps every profile. Unknown names are returned
/// separately so callers can report them.
pub fn select_voices(
    voices: &[VoiceProfile],
    names: &[String],
) -> (Vec<VoiceProfile>, Vec<String>) {
    if names.is_empty() {
        return (voices.to_vec(), Vec::new());
    }

    let selected = voices
        .iter()
        .filter(|v| names.contains(&v.name))
        .cloned()
        .collect();
    let unknown = names
        .iter()
        .filter(|n| !voices.iter().any(|v| &v.name == *n))
        .cloned()
        .collect();
    (selected, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_voices_are_male_and_female() {
        let voices = default_voices();
        assert_eq!(
            voices,
            vec![
                VoiceProfile::new("male", "zh-HK-WanLungNeural"),
                VoiceProfile::new("female", "zh-HK-HiuMaanNeural"),
            ]
        );
    }

    #[test]
    fn empty_selection_keeps_all() {
        let (selected, unknown) = select_voices(&default_voices(), &[]);
        assert_eq!(selected.len(), 2);
        assert!(unknown.is_empty());
    }

    #[test]
    fn selection_filters_and_reports_unknown() {
        let names = vec!["female".to_string(), "robot".to_string()];
        let (selected, unknown) = select_voices(&default_voices(), &names);
        assert_eq!(selected, vec![VoiceProfile::new("female", "zh-HK-HiuMaanNeural")]);
        assert_eq!(unknown, vec!["robot".to_string()]);
    }
}
