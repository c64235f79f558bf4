//! Streaming CSV file reading
//!
//! One forward pass over a `BufReader`, one logical record in memory at a
//! time. Physical lines are assembled into logical records, so a newline
//! inside a quoted field never splits a record.

use crate::csv::CsvParser;
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Streaming CSV reader.
///
/// Reads UTF-8 text (a leading byte-order mark is stripped, not treated as
/// data), yields one row per logical record, and skips completely empty
/// lines between records. Not restartable; the file is consumed in a single
/// pass.
///
/// # Examples
///
/// ```no_run
/// use sheetcast::csv_reader::CsvReader;
///
/// let mut reader = CsvReader::open("data.csv").unwrap().has_header(true);
///
/// while let Some(row) = reader.read_row().unwrap() {
///     println!("{:?}", row);
/// }
/// if let Some(headers) = reader.headers() {
///     println!("header row: {:?}", headers);
/// }
/// ```
#[derive(Debug)]
pub struct CsvReader {
    reader: BufReader<File>,
    line_buffer: String,
    record_buffer: String,
    records_read: u64,
    first_line: bool,
    header_consumed: bool,

    delimiter: u8,
    quote_char: u8,
    has_header: bool,
    headers: Option<Vec<String>>,
}

impl CsvReader {
    /// Opens a CSV file for streaming.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(CsvReader {
            reader: BufReader::new(file),
            line_buffer: String::with_capacity(1024),
            record_buffer: String::with_capacity(1024),
            records_read: 0,
            first_line: true,
            header_consumed: false,
            delimiter: b',',
            quote_char: b'"',
            has_header: false,
            headers: None,
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

    /// Marks the first logical record as a header row (builder pattern).
    ///
    /// The header is consumed on the first [`read_row`](Self::read_row) call
    /// and exposed through [`headers`](Self::headers) instead of being
    /// returned as data. Must be set before reading starts.
    pub fn has_header(mut self, has: bool) -> Self {
        self.has_header = has;
        self
    }

    /// The header row, once it has been consumed.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Consumes the header record now, without touching any data row.
    ///
    /// Returns `Ok(None)` when the reader is not configured for a header or
    /// the input is empty. Subsequent calls are no-ops.
    pub fn read_headers(&mut self) -> Result<Option<&[String]>> {
        if self.has_header && !self.header_consumed {
            self.header_consumed = true;
            let parser = CsvParser::new(self.delimiter, self.quote_char);
            if self.fill_record(&parser)? {
                self.headers = Some(parser.parse_record(&self.record_buffer));
            }
        }
        Ok(self.headers.as_deref())
    }

    /// Number of data rows returned so far (header excluded).
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Reads the next data row.
    ///
    /// Returns `Ok(None)` at end of input. On the first call the header
    /// record, when configured, is consumed before the first data row is
    /// read; an input that ends before any record yields `Ok(None)` with no
    /// headers.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        let parser = CsvParser::new(self.delimiter, self.quote_char);

        if self.has_header && !self.header_consumed {
            self.header_consumed = true;
            if !self.fill_record(&parser)? {
                return Ok(None);
            }
            self.headers = Some(parser.parse_record(&self.record_buffer));
        }

        if !self.fill_record(&parser)? {
            return Ok(None);
        }
        let fields = parser.parse_record(&self.record_buffer);
        self.records_read += 1;
        Ok(Some(fields))
    }

    /// Assembles the next logical record into `record_buffer`.
    ///
    /// Physical lines are appended while the quote state stays open, with the
    /// consumed line break restored as `\n`. Returns `false` at end of input.
    fn fill_record(&mut self, parser: &CsvParser) -> Result<bool> {
        self.record_buffer.clear();
        let mut open = false;

        loop {
            self.line_buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.line_buffer)?;
            if bytes_read == 0 {
                // an unterminated quote at EOF still yields the record
                return Ok(open || !self.record_buffer.is_empty());
            }

            if self.first_line {
                self.first_line = false;
                if self.line_buffer.starts_with('\u{feff}') {
                    self.line_buffer.drain(..'\u{feff}'.len_utf8());
                }
            }

            if self.line_buffer.ends_with('\n') {
                self.line_buffer.pop();
                if self.line_buffer.ends_with('\r') {
                    self.line_buffer.pop();
                }
            }

            if !open && self.record_buffer.is_empty() && self.line_buffer.is_empty() {
                // empty line between records
                continue;
            }

            if open {
                self.record_buffer.push('\n');
            }
            self.record_buffer.push_str(&self.line_buffer);
            open = parser.leaves_quote_open(&self.line_buffer, open);
            if !open {
                return Ok(true);
            }
        }
    }

    /// Iterator over the remaining data rows.
    pub fn rows(&mut self) -> CsvRows<'_> {
        CsvRows { reader: self }
    }
}

/// Iterator adapter over [`CsvReader::read_row`].
pub struct CsvRows<'a> {
    reader: &'a mut CsvReader,
}

impl Iterator for CsvRows<'_> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_row().transpose()
    }
}
