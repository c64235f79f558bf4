//! Streaming CSV file writing
//!
//! Used for reject capture: rows that fail coercion can be appended here in
//! their raw form so a cleaned-up source can be rebuilt and reconverted.

use crate::csv::CsvEncoder;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Streaming CSV writer.
///
/// Rows are encoded into a reusable buffer and flushed through a `BufWriter`,
/// so memory stays constant regardless of row count.
///
/// # Examples
///
/// ```no_run
/// use sheetcast::csv_writer::CsvWriter;
///
/// let mut writer = CsvWriter::create("rejects.csv").unwrap();
/// writer.write_row(["Alice", "30", "NYC"]).unwrap();
/// writer.save().unwrap();
/// ```
pub struct CsvWriter {
    writer: BufWriter<File>,
    buffer: Vec<u8>,
    row_count: u64,
    delimiter: u8,
    quote_char: u8,
}

impl CsvWriter {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(CsvWriter {
            writer: BufWriter::new(file),
            buffer: Vec::with_capacity(4096),
            row_count: 0,
            delimiter: b',',
            quote_char: b'"',
        })
    }

    /// Sets the field delimiter (builder pattern).
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets the quote character (builder pattern).
    pub fn quote_char(mut self, quote: u8) -> Self {
        self.quote_char = quote;
        self
    }

    /// Appends one row, quoting fields as the dialect requires.
    pub fn write_row<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encoder = CsvEncoder::new(self.delimiter, self.quote_char);
        self.buffer.clear();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.buffer.push(self.delimiter);
            }
            encoder.encode_field(field.as_ref(), &mut self.buffer);
        }
        self.buffer.push(b'\n');
        self.writer.write_all(&self.buffer)?;
        self.row_count += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Flushes and closes the file.
    pub fn save(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
