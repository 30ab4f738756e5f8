//! File input and output.
//!
//! The calculation core never touches the filesystem; this module reads the
//! source CSVs into [`RawTable`](crate::normalize::RawTable)s and writes the
//! report, the run summary and the optional audit trail.

mod report_writer;
mod source_reader;

pub use report_writer::{WrittenFiles, write_outputs, write_report_csv};
pub use source_reader::{read_sources, read_table};
