//! CSV field parsing and encoding with RFC 4180-like behavior
//!
//! [`CsvParser`] splits one logical record (which may contain embedded
//! newlines inside quoted fields) into fields; [`CsvEncoder`] renders fields
//! back out with the minimal quoting the dialect requires. Record assembly
//! from physical lines lives in [`crate::csv_reader`].

pub mod encoder;
pub mod parser;

pub use encoder::CsvEncoder;
pub use parser::CsvParser;
