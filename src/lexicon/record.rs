//! Lexicon table parsing into [`LexicalRecord`] values.

use crate::defaults::{COLUMN_DELIMITER, SEPARATOR_MARKER};
use crate::error::{LexvoxError, Result};
use crate::lexicon::normalize::{split_example, strip_latin_annotations, strip_word_annotation};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One normalized row of the lexicon table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexicalRecord {
    /// 1-based position among data rows, malformed ones included. Used for
    /// cache keys and file names, so it must not depend on the layout.
    pub index: usize,
    pub word: String,
    pub gloss: String,
    /// Phonetic transcription, verbatim from the table.
    pub romanization: String,
    pub example_source_text: String,
    /// Parenthetical translation of the example, empty when absent.
    pub example_translation: String,
}

/// How a table line is split into columns.
///
/// The display and synthesis paths validate independently: the display path
/// drops both outer delimiters, the synthesis path keeps the trailing one and
/// so sees an extra, ignored, last field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowLayout {
    Display,
    #[default]
    Synthesis,
}

impl RowLayout {
    /// Number of columns a well-formed row has under this layout.
    pub fn expected_columns(self) -> usize {
        match self {
            RowLayout::Display => 4,
            RowLayout::Synthesis => 5,
        }
    }

    /// Split a table line into trimmed columns.
    pub fn split<'a>(self, line: &'a str) -> Vec<&'a str> {
        let line = line.trim_end_matches(['\r', '\n']);
        let inner = match self {
            RowLayout::Display => line.trim().trim_matches(COLUMN_DELIMITER),
            RowLayout::Synthesis => line.trim_start_matches(COLUMN_DELIMITER),
        };
        inner.split(COLUMN_DELIMITER).map(str::trim).collect()
    }
}

/// A data row dropped for having the wrong number of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// 1-based line number in the source input.
    pub line_number: usize,
    pub columns: usize,
    pub expected: usize,
}

/// Result of parsing a table: the retained records and the dropped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub records: Vec<LexicalRecord>,
    pub rejected: Vec<RowRejection>,
}

/// Whether a line is a table data row.
///
/// Data rows start with the delimiter, are not `|---|` separators and do not
/// contain the header sentinel keyword.
pub fn is_data_row(line: &str, header_sentinel: &str) -> bool {
    line.starts_with(COLUMN_DELIMITER)
        && !line.contains(SEPARATOR_MARKER)
        && (header_sentinel.is_empty() || !line.contains(header_sentinel))
}

/// Build a record from the first four columns of a well-formed row.
fn build_record(index: usize, columns: &[&str]) -> LexicalRecord {
    let (example_source_text, example_translation) = split_example(columns[3]);
    LexicalRecord {
        index,
        word: strip_word_annotation(columns[0]),
        gloss: strip_latin_annotations(columns[1]),
        romanization: columns[2].to_string(),
        example_source_text,
        example_translation,
    }
}

/// Parse raw table lines into records.
///
/// Non-data lines are ignored. Every data row consumes an index; rows with
/// the wrong column count are reported in [`ParseReport::rejected`] and never
/// produce a record, leaving a gap. Both layouts therefore give a row the
/// same index.
pub fn parse_lines<I, S>(lines: I, layout: RowLayout, header_sentinel: &str) -> ParseReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ParseReport::default();
    let expected = layout.expected_columns();
    let mut data_rows = 0;

    for (offset, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if !is_data_row(line, header_sentinel) {
            continue;
        }
        data_rows += 1;

        let columns = layout.split(line);
        if columns.len() != expected {
            report.rejected.push(RowRejection {
                line_number: offset + 1,
                columns: columns.len(),
                expected,
            });
            continue;
        }

        report.records.push(build_record(data_rows, &columns));
    }

    report
}

/// Read a UTF-8 table file and parse it.
pub fn parse_file(path: &Path, layout: RowLayout, header_sentinel: &str) -> Result<ParseReport> {
    let content = std::fs::read_to_string(path).map_err(|e| LexvoxError::TableRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_lines(content.lines(), layout, header_sentinel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SENTINEL: &str = "単語";

    fn table() -> Vec<&'static str> {
        vec![
            "# 広東語 単語リスト",
            "| 単語 | 意味 | 粵拼 | 例文 |",
            "|------|------|------|------|",
            "| 你好（Hello） | こんにちは (hello) | nei5 hou2 | 你好呀！（こんにちは！） |",
            "| 食飯 | ご飯を食べる | sik6 faan6 | 你食咗飯未？（ご飯食べた？） |",
            "| 壞行 | 壊れた |",
            "| 多謝 | ありがとう | do1 ze6 | 多謝你。 |",
        ]
    }

    #[test]
    fn data_row_filter_skips_header_and_separator() {
        assert!(!is_data_row("| 単語 | 意味 |", SENTINEL));
        assert!(!is_data_row("|---|---|", SENTINEL));
        assert!(!is_data_row("no delimiter", SENTINEL));
        assert!(is_data_row("| 你好 | hi |", SENTINEL));
    }

    #[test]
    fn display_layout_requires_four_columns() {
        let columns = RowLayout::Display.split("| a | b | c | d |");
        assert_eq!(columns, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn synthesis_layout_keeps_trailing_field() {
        let columns = RowLayout::Synthesis.split("| a | b | c | d |\n");
        assert_eq!(columns, vec!["a", "b", "c", "d", ""]);
    }

    #[test]
    fn parse_indexes_by_data_row_position() {
        let report = parse_lines(table(), RowLayout::Display, SENTINEL);

        let indices: Vec<usize> = report.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 4]);
        assert_eq!(report.records[2].word, "多謝");
    }

    #[test]
    fn row_without_trailing_delimiter_keeps_later_indices() {
        let lines = [
            "| 你好 | hello | nei5 hou2 | 你好呀！ |",
            "| 食飯 | eat | sik6 faan6 | 食飯未？",
            "| 多謝 | thanks | do1 ze6 | 多謝你。 |",
        ];
        let display = parse_lines(lines, RowLayout::Display, SENTINEL);
        let synthesis = parse_lines(lines, RowLayout::Synthesis, SENTINEL);

        assert_eq!(display.records.len(), 3);
        assert_eq!(synthesis.records.len(), 2);
        for record in &synthesis.records {
            let shown = display.records.iter().find(|r| r.word == record.word).unwrap();
            assert_eq!(shown.index, record.index);
        }
        assert_eq!(synthesis.records[1].index, 3);
    }

    #[test]
    fn parse_reports_malformed_rows_without_records() {
        let report = parse_lines(table(), RowLayout::Display, SENTINEL);

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            report.rejected[0],
            RowRejection {
                line_number: 6,
                columns: 2,
                expected: 4,
            }
        );
        assert!(report.records.iter().all(|r| r.word != "壞行"));
    }

    #[test]
    fn both_layouts_agree_on_well_formed_rows() {
        let display = parse_lines(table(), RowLayout::Display, SENTINEL);
        let synthesis = parse_lines(table(), RowLayout::Synthesis, SENTINEL);
        assert_eq!(display.records, synthesis.records);
        assert_eq!(synthesis.rejected[0].expected, 5);
    }

    #[test]
    fn parse_normalizes_every_column() {
        let report = parse_lines(table(), RowLayout::Display, SENTINEL);
        let first = &report.records[0];

        assert_eq!(first.word, "你好");
        assert_eq!(first.gloss, "こんにちは");
        assert_eq!(first.romanization, "nei5 hou2");
        assert_eq!(first.example_source_text, "你好呀！");
        assert_eq!(first.example_translation, "こんにちは！");

        let third = &report.records[2];
        assert_eq!(third.example_source_text, "多謝你。");
        assert_eq!(third.example_translation, "");
    }

    #[test]
    fn parse_empty_input_yields_nothing() {
        let report = parse_lines(Vec::<String>::new(), RowLayout::Synthesis, SENTINEL);
        assert!(report.records.is_empty());
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn parse_file_reads_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in table() {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();

        let report = parse_file(file.path(), RowLayout::Synthesis, SENTINEL).unwrap();
        assert_eq!(report.records.len(), 3);
    }

    #[test]
    fn parse_file_missing_returns_error() {
        let result = parse_file(
            Path::new("/nonexistent/table.txt"),
            RowLayout::Display,
            SENTINEL,
        );
        match result {
            Err(LexvoxError::TableRead { path, .. }) => {
                assert!(path.contains("table.txt"));
            }
            other => panic!("Expected TableRead error, got {other:?}"),
        }
    }
}
