//! Streaming XLSX output
//!
//! An XLSX file is a ZIP container of SpreadsheetML parts. The writer here
//! streams the worksheet part row by row through the container, so the
//! produced file can hold a million rows without those rows ever being held
//! in memory together.

pub mod workbook;
pub mod xml_writer;

pub use workbook::XlsxWriter;
pub use xml_writer::XmlWriter;
