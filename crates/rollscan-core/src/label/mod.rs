//! Shipping label field extraction.

mod parser;
pub mod rules;

pub use parser::{parse_text_lines, LabelParser};
