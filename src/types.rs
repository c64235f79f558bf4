//! Core column and cell value types
//!
//! A parsed schema is an ordered list of [`ColumnSpec`] entries. Each source
//! row is coerced against that list into a [`TypedRow`] whose values borrow
//! from the raw fields, so no per-cell allocation survives past the row.

use chrono::NaiveDate;
use indexmap::IndexSet;

/// Permitted values of a categorical column.
///
/// The variant fixes both how source fields are matched and how cells are
/// written: an integer domain parses the field as a number and produces
/// numeric cells, a text domain matches fields verbatim and produces inline
/// strings. Declaration order is preserved and duplicates collapse to the
/// first occurrence.
///
/// # Examples
///
/// ```
/// use sheetcast::types::Domain;
///
/// let domain = Domain::of_ints([0, 1, 2]);
/// assert!(domain.contains_int(1));
/// assert_eq!(domain.list_literal(), "0,1,2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    Int(IndexSet<i64>),
    Text(IndexSet<String>),
}

impl Domain {
    /// Builds an integer domain, preserving order and dropping duplicates.
    pub fn of_ints<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Domain::Int(values.into_iter().collect())
    }

    /// Builds a text domain, preserving order and dropping duplicates.
    pub fn of_texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Domain::Text(values.into_iter().map(Into::into).collect())
    }

    /// Number of distinct permitted values.
    pub fn len(&self) -> usize {
        match self {
            Domain::Int(set) => set.len(),
            Domain::Text(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_int(&self, value: i64) -> bool {
        match self {
            Domain::Int(set) => set.contains(&value),
            Domain::Text(_) => false,
        }
    }

    pub fn contains_text(&self, value: &str) -> bool {
        match self {
            Domain::Int(_) => false,
            Domain::Text(set) => set.contains(value),
        }
    }

    /// Comma-joined list of the permitted values, in declaration order.
    ///
    /// This is the literal that ends up inside the dropdown formula of the
    /// produced worksheet.
    pub fn list_literal(&self) -> String {
        match self {
            Domain::Int(set) => {
                let mut out = String::new();
                for (i, v) in set.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&v.to_string());
                }
                out
            }
            Domain::Text(set) => {
                let mut out = String::new();
                for (i, v) in set.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(v);
                }
                out
            }
        }
    }
}

/// Cell type a column coerces its source fields into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, written as an inline string
    Text,
    /// Base-10 signed 64-bit integer
    Integer,
    /// Calendar date, written as an Excel serial with a date number format
    Date,
    /// Value restricted to a fixed domain, with an in-cell dropdown
    Category(Domain),
}

impl ColumnKind {
    /// Returns the domain when the column is categorical.
    pub fn domain(&self) -> Option<&Domain> {
        match self {
            ColumnKind::Category(domain) => Some(domain),
            _ => None,
        }
    }
}

/// One column of the conversion schema, in source order.
///
/// # Examples
///
/// ```
/// use sheetcast::types::{ColumnKind, ColumnSpec};
///
/// let spec = ColumnSpec::new("qty", 10, ColumnKind::Integer);
/// assert_eq!(spec.name, "qty");
/// assert_eq!(spec.width, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Header label written to the first worksheet row
    pub name: String,
    /// Column width in Excel character units
    pub width: u32,
    /// Cell type the column coerces to
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new<S: Into<String>>(name: S, width: u32, kind: ColumnKind) -> Self {
        ColumnSpec {
            name: name.into(),
            width,
            kind,
        }
    }
}

/// A categorical value that passed its membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceValue<'a> {
    Int(i64),
    Text(&'a str),
}

/// A coerced cell value, borrowing from the raw row it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedValue<'a> {
    Text(&'a str),
    Number(i64),
    Calendar(NaiveDate),
    /// A domain member together with the domain that admitted it
    Choice(ChoiceValue<'a>, &'a Domain),
}

/// One coerced row, produced and consumed within a single loop iteration.
pub type TypedRow<'a> = Vec<TypedValue<'a>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_domain_membership() {
        let domain = Domain::of_ints([0, 1, 2]);
        assert!(domain.contains_int(0));
        assert!(domain.contains_int(2));
        assert!(!domain.contains_int(3));
        assert!(!domain.contains_text("1"));
    }

    #[test]
    fn test_text_domain_membership() {
        let domain = Domain::of_texts(["A", "B"]);
        assert!(domain.contains_text("A"));
        assert!(!domain.contains_text("a"));
        assert!(!domain.contains_int(0));
    }

    #[test]
    fn test_duplicates_collapse_in_declaration_order() {
        let domain = Domain::of_ints([3, 1, 3, 2, 1]);
        assert_eq!(domain.len(), 3);
        assert_eq!(domain.list_literal(), "3,1,2");
    }

    #[test]
    fn test_list_literal_for_text_domain() {
        let domain = Domain::of_texts(["yes", "no"]);
        assert_eq!(domain.list_literal(), "yes,no");
    }

    #[test]
    fn test_column_kind_domain_accessor() {
        let kind = ColumnKind::Category(Domain::of_ints([1, 2]));
        assert!(kind.domain().is_some());
        assert!(ColumnKind::Integer.domain().is_none());
    }
}
