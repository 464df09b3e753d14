//! Sentence segmentation into aligned character/romanization pairs.

use crate::defaults::BLANK_ROMANIZATION;
use crate::segment::romanizer::Romanizer;
use serde::Serialize;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// One grapheme with its romanization, or the blank placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentedChar {
    pub character: String,
    pub romanization: String,
}

/// Ordered grapheme/romanization pairs covering a sentence exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentedSentence {
    pub pairs: Vec<SegmentedChar>,
}

impl SegmentedSentence {
    pub fn characters(&self) -> Vec<&str> {
        self.pairs.iter().map(|p| p.character.as_str()).collect()
    }

    pub fn romanizations(&self) -> Vec<&str> {
        self.pairs.iter().map(|p| p.romanization.as_str()).collect()
    }

    /// The characters concatenated back into the original text.
    pub fn text(&self) -> String {
        self.pairs.iter().map(|p| p.character.as_str()).collect()
    }

    /// Romanizations joined by single spaces, for display under the sentence.
    pub fn romanization_line(&self) -> String {
        self.romanizations().join(" ")
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Segments sentences through a [`Romanizer`].
#[derive(Clone)]
pub struct Segmenter {
    romanizer: Arc<dyn Romanizer>,
}

impl Segmenter {
    pub fn new(romanizer: Arc<dyn Romanizer>) -> Self {
        Self { romanizer }
    }

    /// Segment `text` into one pair per extended grapheme cluster, in input
    /// order.
    ///
    /// A romanizer answer that does not match the input grapheme for
    /// grapheme is discarded in favor of per-grapheme lookups.
    pub fn segment(&self, text: &str) -> SegmentedSentence {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let pairs = self.romanizer.romanize(text);
        let aligned = pairs.len() == graphemes.len()
            && pairs.iter().zip(&graphemes).all(|((g, _), expected)| g == expected);

        let pairs = if aligned {
            pairs
        } else {
            tracing::warn!(
                romanizer = self.romanizer.name(),
                text,
                "romanizer output is not aligned to graphemes, aligning per grapheme"
            );
            self.per_grapheme(&graphemes)
        };

        SegmentedSentence {
            pairs: pairs
                .into_iter()
                .map(|(character, romanization)| SegmentedChar {
                    character,
                    romanization: romanization
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| BLANK_ROMANIZATION.to_string()),
                })
                .collect(),
        }
    }

    fn per_grapheme(&self, graphemes: &[&str]) -> Vec<(String, Option<String>)> {
        graphemes
            .iter()
            .map(|&grapheme| {
                let romanization = match self.romanizer.romanize(grapheme).as_slice() {
                    [(g, r)] if g == grapheme => r.clone(),
                    _ => None,
                };
                (grapheme.to_string(), romanization)
            })
            .collect()
    }
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter")
            .field("romanizer", &self.romanizer.name())
            .finish()
    }
}
