//! Schema-driven streaming workbook writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{Datelike, NaiveDate, Utc};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use super::xml_writer::{escape_into, XmlWriter};
use crate::error::{ConvertError, Result};
use crate::schema::Schema;
use crate::types::{ChoiceValue, TypedValue};

/// Hard row capacity of one worksheet, header row included.
const MAX_SHEET_ROWS: u32 = 1_048_576;

/// Style indices fixed by the style sheet written at finish.
const STYLE_DATE: u32 = 1;
const STYLE_HEADER: u32 = 2;

/// Streaming single-sheet XLSX writer.
///
/// Created against a parsed [`Schema`]: column widths and the bold header
/// row are emitted up front, data rows stream through as they arrive, and
/// the closing parts (dropdown validations for categorical columns, workbook
/// metadata, styles) are written by [`finish`](Self::finish). Dropping the
/// writer without finishing leaves an unusable file behind.
///
/// Rows pass through a reusable buffer into the ZIP container, so peak
/// memory does not grow with row count.
///
/// # Examples
///
/// ```no_run
/// use sheetcast::schema::Schema;
/// use sheetcast::types::TypedValue;
/// use sheetcast::xlsx::XlsxWriter;
///
/// let schema = Schema::parse("str,int").unwrap();
/// let mut writer = XlsxWriter::create("out.xlsx", &schema).unwrap();
/// writer
///     .write_row(&[TypedValue::Text("widget"), TypedValue::Number(3)])
///     .unwrap();
/// writer.finish().unwrap();
/// ```
pub struct XlsxWriter<'a> {
    zip: ZipWriter<BufWriter<File>>,
    schema: &'a Schema,
    sheet_name: String,
    data_rows: u32,
    xml_buffer: Vec<u8>,
    cell_refs: Vec<String>,
    flush_interval: u32,
}

impl<'a> XlsxWriter<'a> {
    /// Creates the destination file and writes every part that precedes the
    /// first data row, the column widths and header row included.
    pub fn create<P: AsRef<Path>>(path: P, schema: &'a Schema) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(64 * 1024, file);
        let mut zip = ZipWriter::new(writer);
        let options = Self::file_options();

        zip.start_file("[Content_Types].xml", options)?;
        Self::write_content_types(&mut zip)?;

        zip.start_file("_rels/.rels", options)?;
        Self::write_root_rels(&mut zip)?;

        zip.start_file("docProps/core.xml", options)?;
        Self::write_core_props(&mut zip)?;

        zip.start_file("docProps/app.xml", options)?;
        Self::write_app_props(&mut zip)?;

        let cell_refs = (1..=schema.len() as u32).map(col_to_letter).collect();

        let mut workbook = XlsxWriter {
            zip,
            schema,
            sheet_name: "Sheet1".to_string(),
            data_rows: 0,
            xml_buffer: Vec::with_capacity(8192),
            cell_refs,
            flush_interval: 1000,
        };
        workbook.start_worksheet()?;
        Ok(workbook)
    }

    /// Sets the worksheet tab name recorded at finish. Defaults to `Sheet1`.
    pub fn set_sheet_name<S: Into<String>>(&mut self, name: S) {
        self.sheet_name = name.into();
    }

    /// Sets the number of rows between ZIP flushes.
    pub fn set_flush_interval(&mut self, interval: u32) {
        self.flush_interval = interval.max(1);
    }

    /// Number of data rows written so far (header excluded).
    pub fn data_rows(&self) -> u32 {
        self.data_rows
    }

    fn file_options() -> FileOptions {
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6))
            .large_file(true)
    }

    fn start_worksheet(&mut self) -> Result<()> {
        let options = Self::file_options();
        self.zip.start_file("xl/worksheets/sheet1.xml", options)?;

        let mut xml = XmlWriter::new(&mut self.zip);
        xml.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
        xml.start_element("worksheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;

        // <cols> must precede <sheetData>
        xml.start_element("cols")?;
        xml.close_start_tag()?;
        for (pos, column) in self.schema.columns().iter().enumerate() {
            let index = (pos + 1) as i64;
            xml.start_element("col")?;
            xml.attribute_int("min", index)?;
            xml.attribute_int("max", index)?;
            xml.attribute_int("width", i64::from(column.width))?;
            xml.attribute("customWidth", "1")?;
            xml.close_empty_tag()?;
        }
        xml.end_element("cols")?;

        xml.start_element("sheetData")?;
        xml.close_start_tag()?;
        xml.flush()?;

        self.write_header_row()
    }

    /// Row 1: bold header cells from the schema's column labels.
    fn write_header_row(&mut self) -> Result<()> {
        let buffer = &mut self.xml_buffer;
        buffer.clear();
        buffer.extend_from_slice(b"<row r=\"1\">");
        for (pos, column) in self.schema.columns().iter().enumerate() {
            push_cell_open(buffer, &self.cell_refs[pos], "1");
            push_style(buffer, STYLE_HEADER);
            push_inline_text(buffer, &column.name);
        }
        buffer.extend_from_slice(b"</row>");

        self.zip.write_all(&self.xml_buffer)?;
        Ok(())
    }

    /// Appends one data row of typed cells.
    ///
    /// Cells are rendered per value: inline strings for text, plain numbers
    /// for integers, date-styled serial numbers for calendar dates, and the
    /// domain's element rendering for categorical choices. Empty text yields
    /// no cell at all.
    pub fn write_row(&mut self, values: &[TypedValue<'_>]) -> Result<()> {
        if values.len() != self.schema.len() {
            return Err(ConvertError::State(format!(
                "row has {} values but the schema declares {} columns",
                values.len(),
                self.schema.len()
            )));
        }
        let row_num = self.data_rows + 2;
        if row_num > MAX_SHEET_ROWS {
            return Err(ConvertError::State(format!(
                "worksheet is full: the {MAX_SHEET_ROWS}-row limit is reached"
            )));
        }

        let mut row_digits = itoa::Buffer::new();
        let row_digits = row_digits.format(row_num);

        let buffer = &mut self.xml_buffer;
        buffer.clear();
        buffer.extend_from_slice(b"<row r=\"");
        buffer.extend_from_slice(row_digits.as_bytes());
        buffer.extend_from_slice(b"\">");

        for (pos, value) in values.iter().enumerate() {
            let col_letter = &self.cell_refs[pos];
            match value {
                TypedValue::Text(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    push_cell_open(buffer, col_letter, row_digits);
                    push_inline_text(buffer, text);
                }
                TypedValue::Number(n) => {
                    push_cell_open(buffer, col_letter, row_digits);
                    push_number(buffer, *n);
                }
                TypedValue::Calendar(date) => {
                    push_cell_open(buffer, col_letter, row_digits);
                    push_style(buffer, STYLE_DATE);
                    push_number(buffer, excel_serial(*date));
                }
                TypedValue::Choice(choice, _) => match choice {
                    ChoiceValue::Int(n) => {
                        push_cell_open(buffer, col_letter, row_digits);
                        push_number(buffer, *n);
                    }
                    ChoiceValue::Text(text) => {
                        push_cell_open(buffer, col_letter, row_digits);
                        push_inline_text(buffer, text);
                    }
                },
            }
        }

        buffer.extend_from_slice(b"</row>");
        self.zip.write_all(&self.xml_buffer)?;

        self.data_rows += 1;
        if self.data_rows % self.flush_interval == 0 {
            self.zip.flush()?;
        }
        Ok(())
    }

    /// Closes the worksheet and writes the remaining workbook parts.
    ///
    /// Dropdown validations for categorical columns are bound here to the
    /// exact data range written; with zero data rows there is no range and
    /// no validation block. Consumes the writer, so nothing can be appended
    /// afterwards.
    pub fn finish(mut self) -> Result<()> {
        {
            let mut xml = XmlWriter::new(&mut self.zip);
            xml.end_element("sheetData")?;

            let categorical: Vec<_> = self
                .schema
                .columns()
                .iter()
                .enumerate()
                .filter_map(|(pos, c)| c.kind.domain().map(|d| (pos, d)))
                .collect();
            if !categorical.is_empty() && self.data_rows > 0 {
                let last_row = i64::from(self.data_rows) + 1;
                xml.start_element("dataValidations")?;
                xml.attribute_int("count", categorical.len() as i64)?;
                xml.close_start_tag()?;
                for (pos, domain) in categorical {
                    let letter = &self.cell_refs[pos];
                    xml.start_element("dataValidation")?;
                    xml.attribute("type", "list")?;
                    xml.attribute("allowBlank", "1")?;
                    xml.attribute("showInputMessage", "1")?;
                    xml.attribute("showErrorMessage", "1")?;
                    xml.attribute("sqref", &format!("{letter}2:{letter}{last_row}"))?;
                    xml.close_start_tag()?;
                    xml.start_element("formula1")?;
                    xml.close_start_tag()?;
                    xml.write_escaped(&format!("\"{}\"", domain.list_literal()))?;
                    xml.end_element("formula1")?;
                    xml.end_element("dataValidation")?;
                }
                xml.end_element("dataValidations")?;
            }

            xml.end_element("worksheet")?;
            xml.flush()?;
        }

        let options = Self::file_options();

        self.zip.start_file("xl/workbook.xml", options)?;
        self.write_workbook_xml()?;

        self.zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        Self::write_workbook_rels(&mut self.zip)?;

        self.zip.start_file("xl/styles.xml", options)?;
        Self::write_styles(&mut self.zip)?;

        let mut inner = self.zip.finish()?;
        inner.flush()?;
        Ok(())
    }

    fn write_workbook_xml(&mut self) -> Result<()> {
        let mut xml = XmlWriter::new(&mut self.zip);
        xml.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
        xml.start_element("workbook")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;

        xml.start_element("sheets")?;
        xml.close_start_tag()?;
        xml.start_element("sheet")?;
        xml.attribute("name", &self.sheet_name)?;
        xml.attribute_int("sheetId", 1)?;
        xml.attribute("r:id", "rId1")?;
        xml.close_empty_tag()?;
        xml.end_element("sheets")?;

        xml.end_element("workbook")?;
        xml.flush()
    }

    fn write_content_types<W: Write>(writer: &mut W) -> Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write>(writer: &mut W) -> Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_core_props<W: Write>(writer: &mut W) -> Result<()> {
        let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>sheetcast</dc:creator>
<cp:lastModifiedBy>sheetcast</cp:lastModifiedBy>
<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>
</cp:coreProperties>"#
        );
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_app_props<W: Write>(writer: &mut W) -> Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>sheetcast</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<Company></Company>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>0.5</AppVersion>
</Properties>"#;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write>(writer: &mut W) -> Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_styles<W: Write>(writer: &mut W) -> Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1">
<numFmt numFmtId="164" formatCode="yyyy-mm-dd"/>
</numFmts>
<fonts count="2">
<font><sz val="11"/><name val="Calibri"/></font>
<font><b/><sz val="11"/><name val="Calibri"/></font>
</fonts>
<fills count="2">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
</fills>
<borders count="1">
<border><left/><right/><top/><bottom/><diagonal/></border>
</borders>
<cellStyleXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
</cellStyleXfs>
<cellXfs count="3">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
</cellXfs>
</styleSheet>"#;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }
}

fn push_cell_open(buffer: &mut Vec<u8>, col_letter: &str, row_digits: &str) {
    buffer.extend_from_slice(b"<c r=\"");
    buffer.extend_from_slice(col_letter.as_bytes());
    buffer.extend_from_slice(row_digits.as_bytes());
    buffer.extend_from_slice(b"\"");
}

fn push_style(buffer: &mut Vec<u8>, style: u32) {
    let mut digits = itoa::Buffer::new();
    buffer.extend_from_slice(b" s=\"");
    buffer.extend_from_slice(digits.format(style).as_bytes());
    buffer.extend_from_slice(b"\"");
}

fn push_inline_text(buffer: &mut Vec<u8>, text: &str) {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        buffer.extend_from_slice(b" t=\"inlineStr\"><is><t xml:space=\"preserve\">");
    } else {
        buffer.extend_from_slice(b" t=\"inlineStr\"><is><t>");
    }
    escape_into(buffer, text);
    buffer.extend_from_slice(b"</t></is></c>");
}

fn push_number(buffer: &mut Vec<u8>, n: i64) {
    let mut digits = itoa::Buffer::new();
    buffer.extend_from_slice(b"><v>");
    buffer.extend_from_slice(digits.format(n).as_bytes());
    buffer.extend_from_slice(b"</v></c>");
}

fn col_to_letter(col: u32) -> String {
    let mut letters = String::new();
    let mut n = col;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters
}

/// Days since 1899-12-30, the serial origin Excel inherited from Lotus.
fn excel_serial(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - 693_594
}
