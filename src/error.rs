//! Error types for schema parsing, row coercion, and conversion

use thiserror::Error;

/// Errors in the column definition document.
///
/// Schema errors are fatal and are reported before the destination file is
/// created or modified. `index` fields are 1-based column positions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Document is neither a JSON column list nor a legacy token list
    #[error("malformed schema document: {0}")]
    MalformedDocument(String),

    /// `col_type` token is not one of `str`, `int`, `date`, `kbn_list*`
    #[error("column {index}: unknown column type \"{token}\"")]
    UnknownColumnType { index: usize, token: String },

    /// Categorical column declared without permitted values
    #[error("column {index}: kbn_values must not be empty")]
    EmptyDomain { index: usize },

    /// Domain mixes integers and strings, or contains another JSON type
    #[error("column {index}: kbn_values must be all integers or all strings")]
    InconsistentDomainType { index: usize },

    /// Schema declares no columns at all
    #[error("schema declares zero columns")]
    ZeroColumns,

    /// Width must be a positive integer
    #[error("column {index}: width must be positive")]
    InvalidWidth { index: usize },

    /// Rendered dropdown list would exceed Excel's 255-character limit
    #[error("column {index}: dropdown list is {len} characters (Excel allows 255)")]
    DomainTooLong { index: usize, len: usize },

    /// Source header field count differs from the declared column count
    #[error("schema declares {schema} columns but the source header has {found}")]
    ColumnCountMismatch { schema: usize, found: usize },
}

/// Errors scoped to a single data row.
///
/// Under [`RowErrorPolicy::Skip`](crate::convert::RowErrorPolicy) these are
/// counted and sampled in the report without aborting the conversion; they
/// never affect coercion of later rows. `col` fields are 1-based column
/// positions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("column {col}: \"{value}\" is not an integer")]
    InvalidInteger { col: usize, value: String },

    #[error("column {col}: \"{value}\" is not a valid calendar date")]
    InvalidDate { col: usize, value: String },

    #[error("column {col}: \"{value}\" is not in the declared value list")]
    ValueNotInDomain { col: usize, value: String },
}

/// Top-level conversion error.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A row failed coercion under the fail-fast policy
    #[error("row {row}: {source}")]
    Row { row: u64, source: RowError },

    /// Writer misuse or sheet capacity exceeded
    #[error("invalid writer state: {0}")]
    State(String),

    #[error("conversion cancelled")]
    Cancelled,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;
