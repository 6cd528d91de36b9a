/// Delimited flat-file reading and writing.
pub mod csv;

pub use self::csv::{CsvFileSource, read_table, write_events, write_index, write_panel};
