//! Typed cell coercion
//!
//! Turns one raw record into a [`TypedRow`] against the schema, or reports a
//! [`RowError`] naming the first offending column. Coercion keeps no state
//! between rows, so a rejected row never affects the rows after it.

use chrono::NaiveDate;

use crate::error::RowError;
use crate::schema::Schema;
use crate::types::{ChoiceValue, ColumnKind, Domain, TypedRow, TypedValue};

/// Coerces one raw row into typed cell values.
///
/// The field count is checked against the schema before any per-field work.
/// Text fields pass through unchanged (an empty string is valid empty text);
/// integer and date fields are trimmed before parsing; categorical fields are
/// matched per their domain's element type, so `"2"` satisfies an integer
/// domain containing `2` and a text domain containing `"2"` equally.
///
/// # Examples
///
/// ```
/// use sheetcast::coerce::coerce_row;
/// use sheetcast::schema::Schema;
/// use sheetcast::types::TypedValue;
///
/// let schema = Schema::parse("str,int,date").unwrap();
/// let fields = vec![
///     "widget".to_string(),
///     " 42 ".to_string(),
///     "2023/07/01".to_string(),
/// ];
/// let typed = coerce_row(&fields, &schema).unwrap();
/// assert_eq!(typed[1], TypedValue::Number(42));
/// ```
pub fn coerce_row<'a>(fields: &'a [String], schema: &'a Schema) -> Result<TypedRow<'a>, RowError> {
    let columns = schema.columns();
    if fields.len() != columns.len() {
        return Err(RowError::FieldCountMismatch {
            expected: columns.len(),
            found: fields.len(),
        });
    }

    let mut typed = Vec::with_capacity(columns.len());
    for (pos, (field, column)) in fields.iter().zip(columns).enumerate() {
        let col = pos + 1;
        let value = match &column.kind {
            ColumnKind::Text => TypedValue::Text(field),
            ColumnKind::Integer => match field.trim().parse::<i64>() {
                Ok(n) => TypedValue::Number(n),
                Err(_) => {
                    return Err(RowError::InvalidInteger {
                        col,
                        value: field.clone(),
                    })
                }
            },
            ColumnKind::Date => match parse_date(field) {
                Some(date) => TypedValue::Calendar(date),
                None => {
                    return Err(RowError::InvalidDate {
                        col,
                        value: field.clone(),
                    })
                }
            },
            ColumnKind::Category(domain) => match match_domain(field, domain) {
                Some(choice) => TypedValue::Choice(choice, domain),
                None => {
                    return Err(RowError::ValueNotInDomain {
                        col,
                        value: field.clone(),
                    })
                }
            },
        };
        typed.push(value);
    }
    Ok(typed)
}

/// Matches a raw field against a domain per its element type.
///
/// Integer domains parse the trimmed field as `i64`; text domains compare the
/// raw field verbatim. A field an integer domain cannot parse is simply not a
/// member.
fn match_domain<'a>(field: &'a str, domain: &Domain) -> Option<ChoiceValue<'a>> {
    match domain {
        Domain::Int(_) => field
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| domain.contains_int(*n))
            .map(ChoiceValue::Int),
        Domain::Text(_) => domain.contains_text(field).then_some(ChoiceValue::Text(field)),
    }
}

/// Parses `YYYY sep MM sep DD` where `sep` is `-` or `/` used in both
/// positions. Digit groups are fixed width, so `2023-7-1` does not parse, and
/// the components must name a real calendar date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.trim().as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let sep = bytes[4];
    if (sep != b'-' && sep != b'/') || bytes[7] != sep {
        return None;
    }
    let year = parse_digits(&bytes[0..4])?;
    let month = parse_digits(&bytes[5..7])?;
    let day = parse_digits(&bytes[8..10])?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_digits(bytes: &[u8]) -> Option<u32> {
    let mut n: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n * 10 + u32::from(b - b'0');
    }
    Some(n)
}
