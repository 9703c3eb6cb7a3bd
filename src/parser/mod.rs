//! Photo file name parsing

mod timestamp_parser;

// Re-export the parsing functions
pub use timestamp_parser::{TimestampFields, parse_timestamp_fields, timestamp_from_file_name};
