//! JSON hand-off consumed by the external document renderer.
//!
//! One [`RenderEntry`] per retained record, carrying the display text, the
//! segmented example and the audio paths a page would link to. Text is passed
//! through unescaped.

use crate::cache::{AudioLayout, BatchKey, CacheKey, Role};
use crate::error::{LexvoxError, Result};
use crate::lexicon::LexicalRecord;
use crate::pipeline::batch_index_for;
use crate::segment::Segmenter;
use crate::tts::VoiceProfile;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Display data for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEntry {
    pub index: usize,
    pub word: String,
    pub gloss: String,
    pub romanization: String,
    pub example: RenderExample,
    /// Audio files keyed by voice profile name.
    pub audio: BTreeMap<String, AudioLinks>,
    /// 1-based section (batch) this record is shown in.
    pub section: usize,
    pub sections: usize,
}

/// The example sentence, segmented for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderExample {
    pub source: String,
    pub translation: String,
    pub characters: Vec<String>,
    pub romanizations: Vec<String>,
    /// Romanizations joined for the line under the sentence.
    pub romanization_line: String,
}

/// Audio paths for one record and profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioLinks {
    pub word: PathBuf,
    pub example: PathBuf,
    pub batch: PathBuf,
}

/// Builds render entries for a parsed table.
#[derive(Debug)]
pub struct Renderer<'a> {
    segmenter: &'a Segmenter,
    layout: &'a AudioLayout,
    voices: &'a [VoiceProfile],
    batch_size: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(
        segmenter: &'a Segmenter,
        layout: &'a AudioLayout,
        voices: &'a [VoiceProfile],
        batch_size: usize,
    ) -> Self {
        Self {
            segmenter,
            layout,
            voices,
            batch_size: batch_size.max(1),
        }
    }

    /// Entries for `records`, in order. Section numbers follow the batch
    /// partition so each section links to its batch track.
    pub fn entries(&self, records: &[LexicalRecord]) -> Vec<RenderEntry> {
        let sections = records
            .last()
            .map(|r| batch_index_for(r.index, self.batch_size))
            .unwrap_or(0);
        records
            .iter()
            .map(|record| self.entry(record, sections))
            .collect()
    }

    fn entry(&self, record: &LexicalRecord, sections: usize) -> RenderEntry {
        let section = batch_index_for(record.index, self.batch_size);
        let sentence = self.segmenter.segment(&record.example_source_text);

        let audio = self
            .voices
            .iter()
            .map(|profile| {
                let links = AudioLinks {
                    word: self
                        .layout
                        .item_path(&CacheKey::new(Role::Word, record.index, &profile.name)),
                    example: self.layout.item_path(&CacheKey::new(
                        Role::Example,
                        record.index,
                        &profile.name,
                    )),
                    batch: self.layout.batch_path(&BatchKey::new(&profile.name, section)),
                };
                (profile.name.clone(), links)
            })
            .collect();

        RenderEntry {
            index: record.index,
            word: record.word.clone(),
            gloss: record.gloss.clone(),
            romanization: record.romanization.clone(),
            example: RenderExample {
                source: sentence.text(),
                translation: record.example_translation.clone(),
                characters: sentence.characters().into_iter().map(String::from).collect(),
                romanizations: sentence
                    .romanizations()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                romanization_line: sentence.romanization_line(),
            },
            audio,
            section,
            sections,
        }
    }
}

/// Write entries as JSON lines.
pub fn write_json_lines<W: Write>(entries: &[RenderEntry], mut writer: W) -> Result<()> {
    for entry in entries {
        serde_json::to_writer(&mut writer, entry)?;
        writer.write_all(b"\n")?;
    }
    writer.flush().map_err(LexvoxError::from)
}
