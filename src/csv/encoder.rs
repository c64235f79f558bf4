//! Field encoding for the CSV dialect

/// Renders fields as CSV with minimal quoting.
///
/// A field is quoted only when it contains the delimiter, the quote
/// character, or a line break; quote characters are escaped by doubling.
pub struct CsvEncoder {
    delimiter: u8,
    quote: u8,
}

impl CsvEncoder {
    pub fn new(delimiter: u8, quote_char: u8) -> Self {
        Self {
            delimiter,
            quote: quote_char,
        }
    }

    /// Encodes one row into `buffer`, without a trailing line ending.
    pub fn encode_row<'a, I>(&self, fields: I, buffer: &mut Vec<u8>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                buffer.push(self.delimiter);
            }
            self.encode_field(field, buffer);
        }
    }

    /// Encodes a single field, quoting and escaping as needed.
    pub fn encode_field(&self, field: &str, buffer: &mut Vec<u8>) {
        if !self.needs_quoting(field) {
            buffer.extend_from_slice(field.as_bytes());
            return;
        }
        buffer.push(self.quote);
        for byte in field.bytes() {
            if byte == self.quote {
                buffer.push(self.quote);
            }
            buffer.push(byte);
        }
        buffer.push(self.quote);
    }

    fn needs_quoting(&self, field: &str) -> bool {
        field
            .bytes()
            .any(|b| b == self.delimiter || b == self.quote || b == b'\n' || b == b'\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(fields: &[&str]) -> String {
        let encoder = CsvEncoder::new(b',', b'"');
        let mut buffer = Vec::new();
        encoder.encode_row(fields.iter().copied(), &mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_plain_fields_stay_unquoted() {
        assert_eq!(encode(&["a", "b", "c"]), "a,b,c");
    }

    #[test]
    fn test_delimiter_forces_quoting() {
        assert_eq!(encode(&["a,b", "c"]), r#""a,b",c"#);
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(encode(&[r#"Say "Hello""#, "world"]), r#""Say ""Hello""",world"#);
    }

    #[test]
    fn test_newlines_force_quoting() {
        assert_eq!(encode(&["Line 1\nLine 2", "normal"]), "\"Line 1\nLine 2\",normal");
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(encode(&["a", "", "c"]), "a,,c");
        assert_eq!(encode(&["", "", ""]), ",,");
    }

    #[test]
    fn test_custom_delimiter() {
        let encoder = CsvEncoder::new(b';', b'"');
        let mut buffer = Vec::new();
        encoder.encode_row(["a", "b;c", "d"], &mut buffer);
        assert_eq!(String::from_utf8(buffer).unwrap(), r#"a;"b;c";d"#);
    }

    #[test]
    fn test_round_trips_through_parser() {
        let encoder = CsvEncoder::new(b',', b'"');
        let parser = crate::csv::CsvParser::new(b',', b'"');
        let original = vec!["plain", "with,comma", "with \"quote\"", ""];
        let mut buffer = Vec::new();
        encoder.encode_row(original.iter().copied(), &mut buffer);
        let parsed = parser.parse_record(std::str::from_utf8(&buffer).unwrap());
        assert_eq!(parsed, original);
    }
}
