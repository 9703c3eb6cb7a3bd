//! Utility functions for file handling, geometry helpers and result tables

pub mod file_utils;
pub mod misc;
pub mod table;

// Re-export commonly used utility functions for convenience
pub use file_utils::*;
pub use misc::*;
pub use table::{TableFormat, to_dataframe, write_table};
