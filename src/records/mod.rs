//! Record input and output.
//!
//! Delimited rows come in through [`RecordReader`]; ordered record sequences
//! go out as JSON through [`export_json`].

mod export;
mod reader;

pub use export::{ensure_json_suffix, export_json, read_json, write_records};
pub use reader::{parse_line, RecordReader, DEFAULT_DELIMITER, MAX_FIELDS, MIN_FIELDS};
