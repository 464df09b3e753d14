//! Sentence segmentation into aligned character/romanization pairs.

pub mod romanizer;
pub mod segmenter;

pub use romanizer::{DictionaryRomanizer, MockRomanizer, Romanizer};
pub use segmenter::{SegmentedChar, SegmentedSentence, Segmenter};
