//! # sheetcast
//!
//! A schema-driven streaming CSV to XLSX converter.
//!
//! ## Features
//!
//! - **Streaming Conversion**: Rows flow from CSV to XLSX one at a time, so a
//!   million-row file converts in constant memory
//! - **Typed Columns**: A compact schema document declares each column as
//!   text, integer, date or category and cells land in Excel with the right type
//! - **In-cell Dropdowns**: Category columns get list validations over their
//!   declared values
//! - **Row Error Policy**: Skip and report bad rows, capture them to a reject
//!   file, or fail fast on the first one
//! - **Cancellation**: A shared token stops a long conversion between rows
//!
//! ## Quick Start
//!
//! ### One-call conversion
//!
//! ```rust,no_run
//! use sheetcast::convert;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = r#"[
//!     {"width": 12, "col_type": "str",  "name": "item"},
//!     {"width": 8,  "col_type": "int",  "name": "qty"},
//!     {"width": 12, "col_type": "date", "name": "shipped"},
//!     {"width": 6,  "col_type": "kbn_list1", "kbn_values": [0, 1, 2], "name": "status"}
//! ]"#;
//!
//! let report = convert("orders.csv", "orders.xlsx", schema)?;
//! println!(
//!     "{} rows written, {} rejected in {:.2?}",
//!     report.rows_written, report.rows_rejected, report.elapsed
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Configured conversion
//!
//! ```rust,no_run
//! use sheetcast::{Converter, RowErrorPolicy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Converter::new()
//!     .delimiter(b'\t')
//!     .sheet_name("売上")
//!     .on_row_error(RowErrorPolicy::Skip)
//!     .reject_path("rejected.csv")
//!     .run("orders.tsv", "orders.xlsx", "str,int,date")?;
//!
//! for issue in &report.issues {
//!     eprintln!("row {}: {}", issue.row, issue.error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod coerce;
pub mod convert;
pub mod csv;
pub mod csv_reader;
pub mod csv_writer;
pub mod error;
pub mod schema;
pub mod types;
pub mod xlsx;

pub use convert::{
    convert, CancelToken, ConversionReport, Converter, RowErrorPolicy, RowIssue,
    MAX_SAMPLED_ISSUES,
};
pub use csv_reader::CsvReader;
pub use csv_writer::CsvWriter;
pub use error::{ConvertError, Result, RowError, SchemaError};
pub use schema::Schema;
pub use types::{ChoiceValue, ColumnKind, ColumnSpec, Domain, TypedValue};
pub use xlsx::XlsxWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ConvertError>;
        let _ = std::marker::PhantomData::<Schema>;
        let _ = std::marker::PhantomData::<Converter>;
        let _ = std::marker::PhantomData::<CsvReader>;
        let _ = std::marker::PhantomData::<XlsxWriter>;
    }
}
