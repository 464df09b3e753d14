//! Lexicon table parsing and cell normalization.

pub mod normalize;
pub mod record;

pub use record::{
    LexicalRecord, ParseReport, RowLayout, RowRejection, is_data_row, parse_file, parse_lines,
};
