//! Conversion orchestration
//!
//! Wires the schema parser, row source, coercion engine and workbook writer
//! into one forward pass: parse the schema, stream rows through coercion into
//! the destination, and report what happened. The destination file is valid
//! only when the conversion returns `Ok`; every failure path removes the
//! partial artifact best-effort.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::coerce::coerce_row;
use crate::csv_reader::CsvReader;
use crate::csv_writer::CsvWriter;
use crate::error::{ConvertError, Result, RowError, SchemaError};
use crate::schema::Schema;
use crate::xlsx::XlsxWriter;

/// Upper bound on per-row issues kept in the report.
pub const MAX_SAMPLED_ISSUES: usize = 100;

/// What to do with a row that fails coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowErrorPolicy {
    /// Count and sample the row, then continue. The default.
    #[default]
    Skip,
    /// Abort the conversion on the first bad row.
    Fail,
}

/// Cooperative cancellation handle.
///
/// Clones share one flag; trigger it from any thread and the conversion
/// stops before pulling its next row, removes the partial destination and
/// returns [`ConvertError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// One sampled row failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based data-row ordinal in the source, header excluded
    pub row: u64,
    pub error: RowError,
}

/// Outcome of a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// Data rows pulled from the source
    pub rows_read: u64,
    /// Rows that reached the destination sheet
    pub rows_written: u64,
    /// Rows dropped under [`RowErrorPolicy::Skip`]
    pub rows_rejected: u64,
    /// Wall-clock duration of the whole conversion
    pub elapsed: Duration,
    /// The first [`MAX_SAMPLED_ISSUES`] rejected rows, in source order
    pub issues: Vec<RowIssue>,
}

/// Configurable conversion runner.
///
/// # Examples
///
/// ```no_run
/// use sheetcast::convert::{Converter, RowErrorPolicy};
///
/// let report = Converter::new()
///     .sheet_name("売上")
///     .on_row_error(RowErrorPolicy::Fail)
///     .run("input.csv", "output.xlsx", "str,int,date")
///     .unwrap();
/// assert_eq!(report.rows_rejected, 0);
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    has_header: bool,
    delimiter: u8,
    quote_char: u8,
    policy: RowErrorPolicy,
    sheet_name: String,
    reject_path: Option<PathBuf>,
    cancel: Option<CancelToken>,
}

impl Default for Converter {
    fn default() -> Self {
        Converter {
            has_header: true,
            delimiter: b',',
            quote_char: b'"',
            policy: RowErrorPolicy::Skip,
            sheet_name: "Sheet1".to_string(),
            reject_path: None,
            cancel: None,
        }
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first source record is a header row. Defaults to `true`.
    pub fn has_header(mut self, has: bool) -> Self {
        self.has_header = has;
        self
    }

    /// Sets the source field delimiter. Defaults to `,`.
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets the source quote character. Defaults to `"`.
    pub fn quote_char(mut self, quote: u8) -> Self {
        self.quote_char = quote;
        self
    }

    /// Chooses the policy for rows that fail coercion.
    pub fn on_row_error(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the worksheet tab name.
    pub fn sheet_name<S: Into<String>>(mut self, name: S) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Captures skipped rows, verbatim, into a CSV file at `path`.
    pub fn reject_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.reject_path = Some(path.into());
        self
    }

    /// Installs a cancellation token checked before every row.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Runs the conversion.
    ///
    /// The schema document is parsed first and the source header, when
    /// present, is checked against it, all before the destination file is
    /// touched. Rows then stream through coercion into the workbook one at
    /// a time.
    pub fn run<P, Q>(&self, source: P, destination: Q, schema_document: &str) -> Result<ConversionReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let started = Instant::now();
        let schema = Schema::parse(schema_document)?;

        let mut reader = CsvReader::open(source.as_ref())?
            .delimiter(self.delimiter)
            .quote_char(self.quote_char)
            .has_header(self.has_header);

        if self.has_header {
            // an input that ends before any record still converts to an
            // empty workbook
            if let Some(headers) = reader.read_headers()? {
                if headers.len() != schema.len() {
                    return Err(ConvertError::Schema(SchemaError::ColumnCountMismatch {
                        schema: schema.len(),
                        found: headers.len(),
                    }));
                }
            }
        }

        let destination = destination.as_ref();
        let mut writer = XlsxWriter::create(destination, &schema)?;
        writer.set_sheet_name(&self.sheet_name);

        let mut rejects = match &self.reject_path {
            Some(path) => Some(
                CsvWriter::create(path)?
                    .delimiter(self.delimiter)
                    .quote_char(self.quote_char),
            ),
            None => None,
        };

        let mut rows_read: u64 = 0;
        let mut rows_written: u64 = 0;
        let mut rows_rejected: u64 = 0;
        let mut issues = Vec::new();

        let outcome = loop {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    break Err(ConvertError::Cancelled);
                }
            }

            let fields = match reader.read_row() {
                Ok(Some(fields)) => fields,
                Ok(None) => break Ok(()),
                Err(error) => break Err(error),
            };
            rows_read += 1;

            match coerce_row(&fields, &schema) {
                Ok(typed) => {
                    if let Err(error) = writer.write_row(&typed) {
                        break Err(error);
                    }
                    rows_written += 1;
                }
                Err(row_error) => match self.policy {
                    RowErrorPolicy::Fail => {
                        break Err(ConvertError::Row {
                            row: rows_read,
                            source: row_error,
                        })
                    }
                    RowErrorPolicy::Skip => {
                        rows_rejected += 1;
                        if issues.len() < MAX_SAMPLED_ISSUES {
                            issues.push(RowIssue {
                                row: rows_read,
                                error: row_error,
                            });
                        }
                        if let Some(sink) = rejects.as_mut() {
                            if let Err(error) = sink.write_row(&fields) {
                                break Err(error);
                            }
                        }
                    }
                },
            }
        };

        if let Err(error) = outcome {
            drop(writer);
            let _ = fs::remove_file(destination);
            return Err(error);
        }

        if let Some(sink) = rejects {
            if let Err(error) = sink.save() {
                let _ = fs::remove_file(destination);
                return Err(error);
            }
        }

        if let Err(error) = writer.finish() {
            let _ = fs::remove_file(destination);
            return Err(error);
        }

        Ok(ConversionReport {
            rows_read,
            rows_written,
            rows_rejected,
            elapsed: started.elapsed(),
            issues,
        })
    }
}

/// Converts a CSV file into an XLSX workbook with default options: header
/// row expected, comma delimited, bad rows skipped.
///
/// # Examples
///
/// ```no_run
/// use sheetcast::convert;
///
/// let report = convert("input.csv", "output.xlsx", "str,int,date").unwrap();
/// println!(
///     "{} written, {} rejected in {:.2?}",
///     report.rows_written, report.rows_rejected, report.elapsed
/// );
/// ```
pub fn convert<P, Q>(source: P, destination: Q, schema_document: &str) -> Result<ConversionReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Converter::new().run(source, destination, schema_document)
}
