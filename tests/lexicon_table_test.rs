//! Integration tests for table parsing, segmentation and the render hand-off.

use std::io::Write;
use std::sync::Arc;

use lexvox::cache::AudioLayout;
use lexvox::lexicon::{RowLayout, parse_file, parse_lines};
use lexvox::render::{Renderer, write_json_lines};
use lexvox::segment::{DictionaryRomanizer, Segmenter};
use lexvox::tts::default_voices;
use tempfile::NamedTempFile;

const SENTINEL: &str = "単語";

const TABLE: &str = "\
# 広東語 単語リスト

| 単語 | 意味 | 粵拼 | 例文 |
|------|------|------|------|
| 你好（Hello） | こんにちは (hello) | nei5 hou2 | 你好呀！（こんにちは！） |
| 食飯 | ご飯を食べる（食事） | sik6 faan6 | 你食咗飯未？（ご飯食べた？） |
| 壞行 | 壊れた |
| 多謝 | ありがとう (thank you) | do1 ze6 | 多謝你。 |
";

const DICTIONARY: &str = "\
# entry syllables
你好 nei5 hou2
你 nei5
好 hou2
呀 aa3
食飯 sik6 faan6
食 sik6
咗 zo2
飯 faan6
未 mei6
多謝 do1 ze6
";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_both_layouts_retain_the_same_records() {
    let display = parse_lines(TABLE.lines(), RowLayout::Display, SENTINEL);
    let synthesis = parse_lines(TABLE.lines(), RowLayout::Synthesis, SENTINEL);

    assert_eq!(display.records, synthesis.records);
    assert_eq!(display.records.len(), 3);
    assert_eq!(display.rejected.len(), 1);
}

#[test]
fn test_malformed_rows_leave_an_index_gap() {
    let report = parse_lines(TABLE.lines(), RowLayout::Synthesis, SENTINEL);

    let indices: Vec<usize> = report.records.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![1, 2, 4]);
    assert_eq!(report.records[2].word, "多謝");
    assert_eq!(report.rejected[0].line_number, 7);
}

#[test]
fn test_layouts_agree_on_indices_of_shared_rows() {
    let table = "\
| 単語 | 意味 | 粵拼 | 例文 |
|------|------|------|------|
| 你好 | こんにちは | nei5 hou2 | 你好呀！ |
| 食飯 | ご飯を食べる | sik6 faan6 | 你食咗飯未？
| 壞行 | 壊れた |
| 多謝 | ありがとう | do1 ze6 | 多謝你。 |
";
    let display = parse_lines(table.lines(), RowLayout::Display, SENTINEL);
    let synthesis = parse_lines(table.lines(), RowLayout::Synthesis, SENTINEL);

    // The row without a trailing delimiter is display-only
    assert_eq!(display.records.len(), 3);
    assert_eq!(synthesis.records.len(), 2);

    for record in &synthesis.records {
        let shown = display
            .records
            .iter()
            .find(|r| r.word == record.word)
            .unwrap();
        assert_eq!(shown.index, record.index, "index of {}", record.word);
    }
    assert_eq!(synthesis.records.last().unwrap().index, 4);
}

#[test]
fn test_cells_are_normalized() {
    let report = parse_lines(TABLE.lines(), RowLayout::Synthesis, SENTINEL);
    let first = &report.records[0];
    let second = &report.records[1];
    let third = &report.records[2];

    assert_eq!(first.word, "你好");
    assert_eq!(first.gloss, "こんにちは");
    assert_eq!(first.romanization, "nei5 hou2");
    assert_eq!(first.example_source_text, "你好呀！");
    assert_eq!(first.example_translation, "こんにちは！");

    // Target-script parenthetical survives gloss stripping
    assert_eq!(second.gloss, "ご飯を食べる（食事）");
    assert_eq!(second.example_source_text, "你食咗飯未？");

    assert_eq!(third.gloss, "ありがとう");
    assert_eq!(third.example_source_text, "多謝你。");
    assert_eq!(third.example_translation, "");
}

#[test]
fn test_parse_file_matches_parse_lines() {
    let table = write_temp(TABLE);
    let report = parse_file(table.path(), RowLayout::Display, SENTINEL).unwrap();
    assert_eq!(
        report,
        parse_lines(TABLE.lines(), RowLayout::Display, SENTINEL)
    );
}

#[test]
fn test_dictionary_segmentation_of_examples() {
    let dictionary = write_temp(DICTIONARY);
    let romanizer = DictionaryRomanizer::from_file(dictionary.path()).unwrap();
    let segmenter = Segmenter::new(Arc::new(romanizer));

    let sentence = segmenter.segment("你食咗飯未？");

    assert_eq!(sentence.text(), "你食咗飯未？");
    assert_eq!(
        sentence.romanizations(),
        vec!["nei5", "sik6", "zo2", "faan6", "mei6", " "]
    );
    assert_eq!(sentence.romanization_line(), "nei5 sik6 zo2 faan6 mei6  ");
}

#[test]
fn test_render_hand_off_for_table() {
    let dictionary = write_temp(DICTIONARY);
    let segmenter = Segmenter::new(Arc::new(
        DictionaryRomanizer::from_file(dictionary.path()).unwrap(),
    ));
    let layout = AudioLayout::new("audio", true, "wav");
    let voices = default_voices();
    let report = parse_lines(TABLE.lines(), RowLayout::Display, SENTINEL);

    let entries = Renderer::new(&segmenter, &layout, &voices, 10).entries(&report.records);
    let mut out = Vec::new();
    write_json_lines(&entries, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let values: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["example"]["characters"][0], "你");
    assert_eq!(values[0]["example"]["romanizations"][1], "hou2");
    assert_eq!(values[2]["index"], 4);
    assert_eq!(values[2]["audio"]["male"]["word"], "audio/male/words/word_004.wav");
    assert_eq!(values[2]["audio"]["female"]["batch"], "audio/female/batch/output_batch_1.wav");
    assert_eq!(values[2]["sections"], 1);
}
