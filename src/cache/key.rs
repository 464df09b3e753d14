//! Cache keys and the deterministic on-disk audio layout.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Which part of a record an audio clip speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Word,
    Example,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Word => "word",
            Role::Example => "example",
        }
    }

    /// Directory name holding this role's clips.
    pub fn plural(self) -> &'static str {
        match self {
            Role::Word => "words",
            Role::Example => "examples",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one cached clip. Position-keyed: the text is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub role: Role,
    pub index: usize,
    pub profile: String,
}

impl CacheKey {
    pub fn new(role: Role, index: usize, profile: &str) -> Self {
        Self {
            role,
            index,
            profile: profile.to_string(),
        }
    }
}

/// Identity of one combined batch track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub profile: String,
    pub batch_index: usize,
}

impl BatchKey {
    pub fn new(profile: &str, batch_index: usize) -> Self {
        Self {
            profile: profile.to_string(),
            batch_index,
        }
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} batch {}", self.profile, self.batch_index)
    }
}

/// Maps cache and batch keys to file paths.
///
/// ```text
/// <root>/<profile>/words/word_001.<ext>
/// <root>/<profile>/examples/example_001.<ext>
/// <root>/<profile>/batch/output_batch_1.<ext>
/// ```
///
/// The `<profile>` segment is omitted in single-profile layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLayout {
    root: PathBuf,
    per_profile: bool,
    extension: String,
}

impl AudioLayout {
    pub fn new(root: impl Into<PathBuf>, per_profile: bool, extension: &str) -> Self {
        Self {
            root: root.into(),
            per_profile,
            extension: extension.to_string(),
        }
    }

    /// Directory holding one profile's words, examples and batches.
    pub fn profile_dir(&self, profile: &str) -> PathBuf {
        if self.per_profile {
            self.root.join(profile)
        } else {
            self.root.clone()
        }
    }

    pub fn item_path(&self, key: &CacheKey) -> PathBuf {
        self.profile_dir(&key.profile).join(key.role.plural()).join(format!(
            "{}_{:03}.{}",
            key.role, key.index, self.extension
        ))
    }

    pub fn batch_path(&self, key: &BatchKey) -> PathBuf {
        self.profile_dir(&key.profile)
            .join("batch")
            .join(format!("output_batch_{}.{}", key.batch_index, self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names() {
        assert_eq!(Role::Word.to_string(), "word");
        assert_eq!(Role::Example.plural(), "examples");
    }

    #[test]
    fn item_path_pads_index_to_three_digits() {
        let layout = AudioLayout::new("audio", true, "wav");
        let path = layout.item_path(&CacheKey::new(Role::Word, 7, "male"));
        assert_eq!(path, PathBuf::from("audio/male/words/word_007.wav"));
    }

    #[test]
    fn item_path_keeps_wide_indices() {
        let layout = AudioLayout::new("audio", true, "wav");
        let path = layout.item_path(&CacheKey::new(Role::Example, 1234, "female"));
        assert_eq!(path, PathBuf::from("audio/female/examples/example_1234.wav"));
    }

    #[test]
    fn batch_path_is_unpadded() {
        let layout = AudioLayout::new("audio", true, "wav");
        let path = layout.batch_path(&BatchKey::new("female", 3));
        assert_eq!(path, PathBuf::from("audio/female/batch/output_batch_3.wav"));
    }

    #[test]
    fn single_profile_layout_omits_profile_segment() {
        let layout = AudioLayout::new("audio", false, "mp3");
        assert_eq!(
            layout.item_path(&CacheKey::new(Role::Example, 12, "default")),
            PathBuf::from("audio/examples/example_012.mp3")
        );
        assert_eq!(
            layout.batch_path(&BatchKey::new("default", 2)),
            PathBuf::from("audio/batch/output_batch_2.mp3")
        );
    }

    #[test]
    fn cache_key_ignores_text() {
        let a = CacheKey::new(Role::Word, 1, "male");
        let b = CacheKey::new(Role::Word, 1, "male");
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::new(Role::Word, 1, "female"));
    }
}
