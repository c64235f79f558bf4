//! Column schema parsing
//!
//! A schema document declares the output columns in order. Two surfaces are
//! accepted: a structured JSON array (the primary form) and a legacy list of
//! bare type tokens. Both normalize to the same [`Schema`] model, so the rest
//! of the crate never knows which surface a schema came from.

use indexmap::IndexSet;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::types::{ColumnKind, ColumnSpec, Domain};

/// Longest comma-joined value list Excel accepts in a dropdown formula.
const MAX_LIST_LITERAL_LEN: usize = 255;

/// Default column width for the legacy token surface.
const LEGACY_WIDTH: u32 = 10;

/// One entry of the structured JSON surface.
#[derive(Debug, Deserialize)]
struct RawColumnDef {
    width: i64,
    col_type: String,
    #[serde(default)]
    kbn_values: Option<Vec<Value>>,
    #[serde(default)]
    name: Option<String>,
}

/// An ordered, validated column list.
///
/// Parsed once per conversion and immutable afterwards; entry order is the
/// authoritative column order of both the source and the output sheet.
///
/// # Examples
///
/// ```
/// use sheetcast::schema::Schema;
///
/// let schema = Schema::parse(r#"[
///     {"width": 8, "col_type": "str", "name": "code"},
///     {"width": 5, "col_type": "kbn_list1", "kbn_values": [0, 1, 2]}
/// ]"#).unwrap();
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.columns()[0].name, "code");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Parses a schema document, auto-detecting the surface syntax.
    ///
    /// Documents whose first non-whitespace character is `[` or `{` are
    /// treated as the JSON surface; everything else as the legacy token list.
    pub fn parse(document: &str) -> Result<Self, SchemaError> {
        let doc = document.trim_start_matches('\u{feff}');
        let trimmed = doc.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            Self::parse_structured(doc)
        } else {
            Self::parse_legacy(doc)
        }
    }

    /// Builds a schema from already-constructed columns, enforcing the same
    /// invariants the parsers do.
    pub fn from_columns(columns: Vec<ColumnSpec>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::ZeroColumns);
        }
        for (pos, column) in columns.iter().enumerate() {
            let index = pos + 1;
            if column.width == 0 {
                return Err(SchemaError::InvalidWidth { index });
            }
            if let ColumnKind::Category(domain) = &column.kind {
                if domain.is_empty() {
                    return Err(SchemaError::EmptyDomain { index });
                }
                let len = domain.list_literal().len();
                if len > MAX_LIST_LITERAL_LEN {
                    return Err(SchemaError::DomainTooLong { index, len });
                }
            }
        }
        Ok(Schema { columns })
    }

    fn parse_structured(doc: &str) -> Result<Self, SchemaError> {
        let raws: Vec<RawColumnDef> = serde_json::from_str(doc)
            .map_err(|e| SchemaError::MalformedDocument(e.to_string()))?;

        let mut columns = Vec::with_capacity(raws.len());
        for (pos, raw) in raws.iter().enumerate() {
            let index = pos + 1;
            let width = u32::try_from(raw.width)
                .ok()
                .filter(|w| *w > 0)
                .ok_or(SchemaError::InvalidWidth { index })?;
            let kind = match parse_type_token(&raw.col_type) {
                Some(TypeToken::Str) => ColumnKind::Text,
                Some(TypeToken::Int) => ColumnKind::Integer,
                Some(TypeToken::Date) => ColumnKind::Date,
                Some(TypeToken::KbnList) => {
                    let values = raw
                        .kbn_values
                        .as_deref()
                        .ok_or(SchemaError::EmptyDomain { index })?;
                    ColumnKind::Category(domain_from_values(index, values)?)
                }
                None => {
                    return Err(SchemaError::UnknownColumnType {
                        index,
                        token: raw.col_type.clone(),
                    })
                }
            };
            let name = match &raw.name {
                Some(name) => name.clone(),
                None => format!("col{index}"),
            };
            columns.push(ColumnSpec { name, width, kind });
        }
        Self::from_columns(columns)
    }

    fn parse_legacy(doc: &str) -> Result<Self, SchemaError> {
        let mut columns = Vec::new();
        for token in doc.split(|c| c == ',' || c == '\n' || c == '\r') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let index = columns.len() + 1;
            let kind = match parse_type_token(token) {
                Some(TypeToken::Str) => ColumnKind::Text,
                Some(TypeToken::Int) => ColumnKind::Integer,
                Some(TypeToken::Date) => ColumnKind::Date,
                Some(TypeToken::KbnList) => ColumnKind::Category(Domain::of_ints([0, 1, 2])),
                None => {
                    return Err(SchemaError::UnknownColumnType {
                        index,
                        token: token.to_string(),
                    })
                }
            };
            columns.push(ColumnSpec::new(format!("col{index}"), LEGACY_WIDTH, kind));
        }
        Self::from_columns(columns)
    }

    /// Number of declared columns. Always at least one.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Declared columns in source order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Header labels in column order.
    pub fn header_labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

enum TypeToken {
    Str,
    Int,
    Date,
    KbnList,
}

/// Case-insensitive type token match; `kbn_list` takes any suffix so each
/// `kbn_list1`, `kbn_list2`, … names its own categorical column.
fn parse_type_token(token: &str) -> Option<TypeToken> {
    let lower = token.trim().to_ascii_lowercase();
    if lower.starts_with("kbn_list") {
        return Some(TypeToken::KbnList);
    }
    match lower.as_str() {
        "str" => Some(TypeToken::Str),
        "int" => Some(TypeToken::Int),
        "date" => Some(TypeToken::Date),
        _ => None,
    }
}

fn domain_from_values(index: usize, values: &[Value]) -> Result<Domain, SchemaError> {
    if values.is_empty() {
        return Err(SchemaError::EmptyDomain { index });
    }
    match &values[0] {
        Value::Number(_) => {
            let mut set = IndexSet::with_capacity(values.len());
            for value in values {
                let n = value
                    .as_i64()
                    .ok_or(SchemaError::InconsistentDomainType { index })?;
                set.insert(n);
            }
            Ok(Domain::Int(set))
        }
        Value::String(_) => {
            let mut set = IndexSet::with_capacity(values.len());
            for value in values {
                let s = value
                    .as_str()
                    .ok_or(SchemaError::InconsistentDomainType { index })?;
                set.insert(s.to_string());
            }
            Ok(Domain::Text(set))
        }
        _ => Err(SchemaError::InconsistentDomainType { index }),
    }
}
