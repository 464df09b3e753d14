//! Grapheme-to-romanization capability.
//!
//! The segmenter treats romanization as a black box so the dictionary-backed
//! implementation can be swapped for a richer linguistic backend.

use crate::error::{LexvoxError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Trait for mapping text to per-grapheme romanizations.
pub trait Romanizer: Send + Sync {
    /// Romanize `text`, returning one `(grapheme, romanization)` pair per
    /// grapheme in input order. Punctuation and unknown graphemes map to `None`.
    fn romanize(&self, text: &str) -> Vec<(String, Option<String>)>;

    /// Return the name of this romanizer for logging.
    fn name(&self) -> &str;
}

impl<T: Romanizer + ?Sized> Romanizer for Arc<T> {
    fn romanize(&self, text: &str) -> Vec<(String, Option<String>)> {
        (**self).romanize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Romanizer backed by a pronunciation dictionary.
///
/// Dictionary files hold one entry per line: the written form followed by one
/// syllable per grapheme, whitespace-separated (`你好 nei5 hou2`). Blank
/// lines and lines starting with `#` are ignored. Text is segmented greedily
/// by longest matching entry, falling back to single graphemes.
#[derive(Debug, Clone, Default)]
pub struct DictionaryRomanizer {
    entries: HashMap<String, Vec<String>>,
    longest: usize,
}

impl DictionaryRomanizer {
    /// Build a romanizer from `(written form, syllables)` entries.
    ///
    /// Entries whose syllable count does not match their grapheme count are
    /// skipped, since they cannot be aligned per grapheme.
    pub fn from_entries<I, W, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (W, Vec<S>)>,
        W: Into<String>,
        S: Into<String>,
    {
        let mut romanizer = Self::default();
        for (word, syllables) in entries {
            romanizer.insert(word.into(), syllables.into_iter().map(Into::into).collect());
        }
        romanizer
    }

    /// Load a dictionary file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LexvoxError::Dictionary {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse dictionary text in the file format described on the type.
    pub fn parse(content: &str) -> Self {
        let mut romanizer = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let syllables: Vec<String> = parts.map(str::to_string).collect();
            romanizer.insert(word.to_string(), syllables);
        }
        romanizer
    }

    fn insert(&mut self, word: String, syllables: Vec<String>) {
        let len = word.graphemes(true).count();
        if len == 0 || syllables.len() != len {
            return;
        }
        self.longest = self.longest.max(len);
        self.entries.insert(word, syllables);
    }

    /// Number of dictionary entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Romanizer for DictionaryRomanizer {
    fn romanize(&self, text: &str) -> Vec<(String, Option<String>)> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let mut pairs = Vec::with_capacity(graphemes.len());
        let mut pos = 0;

        'outer: while pos < graphemes.len() {
            let max_len = self.longest.min(graphemes.len() - pos);
            for len in (1..=max_len).rev() {
                let candidate = graphemes[pos..pos + len].concat();
                if let Some(syllables) = self.entries.get(&candidate) {
                    for (grapheme, syllable) in graphemes[pos..pos + len].iter().zip(syllables) {
                        pairs.push((grapheme.to_string(), Some(syllable.clone())));
                    }
                    pos += len;
                    continue 'outer;
                }
            }
            pairs.push((graphemes[pos].to_string(), None));
            pos += 1;
        }

        pairs
    }

    fn name(&self) -> &str {
        "dictionary"
    }
}

/// Mock romanizer for testing.
///
/// Maps single graphemes through a fixed table; everything else is `None`.
#[derive(Debug, Clone, Default)]
pub struct MockRomanizer {
    table: HashMap<String, String>,
}

impl MockRomanizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the romanization returned for `grapheme`.
    pub fn with(mut self, grapheme: &str, romanization: &str) -> Self {
        self.table.insert(grapheme.to_string(), romanization.to_string());
        self
    }
}

impl Romanizer for MockRomanizer {
    fn romanize(&self, text: &str) -> Vec<(String, Option<String>)> {
        text.graphemes(true)
            .map(|g| (g.to_string(), self.table.get(g).cloned()))
            .collect()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dictionary() -> DictionaryRomanizer {
        DictionaryRomanizer::parse(
            "# jyutping\n\
             你 nei5\n\
             好 hou2\n\
             你好 nei5 hou2\n\
             食 sik6\n\
             飯 faan6\n\
             未 mei6\n\
             咗 zo2\n\
             行 haang4\n\
             銀行 ngan4 hong4\n",
        )
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let romanizer = DictionaryRomanizer::parse("# comment\n\n你 nei5\n");
        assert_eq!(romanizer.len(), 1);
    }

    #[test]
    fn parse_skips_misaligned_entries() {
        let romanizer = DictionaryRomanizer::parse("你好 nei5\n你 nei5\n");
        assert_eq!(romanizer.len(), 1);
    }

    #[test]
    fn longest_match_picks_word_reading() {
        let romanizer = dictionary();
        let pairs = romanizer.romanize("銀行");
        assert_eq!(
            pairs,
            vec![
                ("銀".to_string(), Some("ngan4".to_string())),
                ("行".to_string(), Some("hong4".to_string())),
            ]
        );
    }

    #[test]
    fn single_character_fallback_uses_char_reading() {
        let romanizer = dictionary();
        let pairs = romanizer.romanize("行");
        assert_eq!(pairs, vec![("行".to_string(), Some("haang4".to_string()))]);
    }

    #[test]
    fn punctuation_and_unknown_map_to_none() {
        let romanizer = dictionary();
        let pairs = romanizer.romanize("你食咗飯未？");
        let readings: Vec<Option<&str>> = pairs.iter().map(|(_, r)| r.as_deref()).collect();
        assert_eq!(
            readings,
            vec![
                Some("nei5"),
                Some("sik6"),
                Some("zo2"),
                Some("faan6"),
                Some("mei6"),
                None,
            ]
        );
    }

    #[test]
    fn empty_dictionary_returns_all_none() {
        let romanizer = DictionaryRomanizer::default();
        let pairs = romanizer.romanize("你好");
        assert!(pairs.iter().all(|(_, r)| r.is_none()));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn from_file_loads_dictionary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "早 zou2").unwrap();
        writeln!(file, "晨 san4").unwrap();
        file.flush().unwrap();

        let romanizer = DictionaryRomanizer::from_file(file.path()).unwrap();
        assert_eq!(romanizer.len(), 2);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = DictionaryRomanizer::from_file(Path::new("/nonexistent/jyutping.txt"));
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("romanization dictionary"),
            "Error should mention the dictionary: {}",
            err
        );
    }

    #[test]
    fn mock_romanizer_maps_configured_chars() {
        let romanizer = MockRomanizer::new().with("你", "nei5");
        let pairs = romanizer.romanize("你！");
        assert_eq!(pairs[0].1.as_deref(), Some("nei5"));
        assert_eq!(pairs[1].1, None);
    }

    #[test]
    fn combining_marks_stay_with_their_base() {
        let romanizer = DictionaryRomanizer::from_entries([("e\u{301}好", vec!["e1", "hou2"])]);
        assert_eq!(romanizer.len(), 1);
        assert_eq!(
            romanizer.romanize("e\u{301}好"),
            vec![
                ("e\u{301}".to_string(), Some("e1".to_string())),
                ("好".to_string(), Some("hou2".to_string())),
            ]
        );
    }

    #[test]
    fn romanizer_trait_is_object_safe() {
        let romanizer: Box<dyn Romanizer> = Box::new(MockRomanizer::new());
        assert_eq!(romanizer.name(), "mock");
    }
}
