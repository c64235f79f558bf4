//! Record splitting for the CSV dialect

/// Splits logical CSV records into fields.
///
/// The dialect is RFC 4180-like: fields may be quoted, quoted fields may
/// contain the delimiter, the quote character doubled as an escape, and
/// newlines. Delimiter and quote are single ASCII bytes, so scanning works
/// on bytes and never splits a multi-byte character.
pub struct CsvParser {
    delimiter: u8,
    quote: u8,
}

impl CsvParser {
    pub fn new(delimiter: u8, quote_char: u8) -> Self {
        Self {
            delimiter,
            quote: quote_char,
        }
    }

    /// Splits one complete logical record into its fields.
    ///
    /// The record must not carry a trailing line ending; embedded newlines
    /// inside quoted fields are kept as part of the field value. An
    /// unterminated quote runs to the end of the record.
    pub fn parse_record(&self, record: &str) -> Vec<String> {
        let bytes = record.as_bytes();
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut span_start = 0;
        let mut in_quotes = false;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            if in_quotes {
                if b == self.quote {
                    field.push_str(&record[span_start..i]);
                    if bytes.get(i + 1) == Some(&self.quote) {
                        field.push(self.quote as char);
                        i += 2;
                    } else {
                        in_quotes = false;
                        i += 1;
                    }
                    span_start = i;
                } else {
                    i += 1;
                }
            } else if b == self.quote {
                field.push_str(&record[span_start..i]);
                in_quotes = true;
                i += 1;
                span_start = i;
            } else if b == self.delimiter {
                field.push_str(&record[span_start..i]);
                fields.push(std::mem::take(&mut field));
                i += 1;
                span_start = i;
            } else {
                i += 1;
            }
        }

        field.push_str(&record[span_start..]);
        fields.push(field);
        fields
    }

    /// Reports whether a chunk ends inside an unterminated quoted field,
    /// given the state it started in.
    ///
    /// Escaped quote pairs toggle twice and cancel out, so this reduces to
    /// the quote-character parity of the chunk. The reader uses it to decide
    /// when physical lines still belong to the current record.
    pub fn leaves_quote_open(&self, chunk: &str, open_before: bool) -> bool {
        let toggles = chunk.bytes().filter(|b| *b == self.quote).count();
        open_before ^ (toggles % 2 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CsvParser {
        CsvParser::new(b',', b'"')
    }

    #[test]
    fn test_splits_simple_record() {
        assert_eq!(parser().parse_record("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        assert_eq!(parser().parse_record(r#""a,b",c"#), vec!["a,b", "c"]);
    }

    #[test]
    fn test_doubled_quote_escapes() {
        assert_eq!(
            parser().parse_record(r#""Say ""Hello""",world"#),
            vec![r#"Say "Hello""#, "world"]
        );
    }

    #[test]
    fn test_empty_fields_survive() {
        assert_eq!(parser().parse_record("a,,c"), vec!["a", "", "c"]);
        assert_eq!(parser().parse_record(",,"), vec!["", "", ""]);
        assert_eq!(parser().parse_record(r#""","""#), vec!["", ""]);
    }

    #[test]
    fn test_empty_record_is_one_empty_field() {
        assert_eq!(parser().parse_record(""), vec![""]);
    }

    #[test]
    fn test_single_unquoted_field() {
        assert_eq!(parser().parse_record("hello"), vec!["hello"]);
    }

    #[test]
    fn test_embedded_newline_stays_in_field() {
        assert_eq!(
            parser().parse_record("\"Line 1\nLine 2\",normal"),
            vec!["Line 1\nLine 2", "normal"]
        );
    }

    #[test]
    fn test_mixed_quoted_and_unquoted() {
        assert_eq!(parser().parse_record(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = CsvParser::new(b';', b'"');
        assert_eq!(parser.parse_record(r#"a;"b;c";d"#), vec!["a", "b;c", "d"]);
    }

    #[test]
    fn test_multibyte_text_passes_through() {
        assert_eq!(
            parser().parse_record("商品A,\"値引き, 10%\""),
            vec!["商品A", "値引き, 10%"]
        );
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(parser().parse_record("\"abc"), vec!["abc"]);
    }

    #[test]
    fn test_quote_parity_tracks_open_state() {
        let p = parser();
        assert!(p.leaves_quote_open("a,\"b", false));
        assert!(!p.leaves_quote_open("a,\"b\"", false));
        assert!(!p.leaves_quote_open("c\",d", true));
        // escaped pair does not close the field
        assert!(p.leaves_quote_open("a \"\" b", true));
        assert!(!p.leaves_quote_open("plain", false));
    }
}
