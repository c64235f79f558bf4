//! Integration tests for sheetcast

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sheetcast::{convert, ConvertError, Converter, RowError, RowErrorPolicy, Schema};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_part(path: &Path, part: &str) -> String {
    let file = fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(part).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

fn sheet_xml(path: &Path) -> String {
    read_part(path, "xl/worksheets/sheet1.xml")
}

#[test]
fn test_category_scenario_keeps_valid_rows_and_rejects_the_rest() {
    let schema = r#"[
        {"width": 8,  "col_type": "str"},
        {"width": 5,  "col_type": "kbn_list", "kbn_values": [0, 1, 2]},
        {"width": 10, "col_type": "int"}
    ]"#;
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "name,status,amount\nA,1,10\nB,2,20\nC,9,30\n");
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, schema).unwrap();
    assert_eq!(report.rows_read, 3);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.rows_rejected, 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].row, 3);
    assert!(matches!(
        report.issues[0].error,
        RowError::ValueNotInDomain { col: 2, .. }
    ));

    let xml = sheet_xml(&dst);
    // kept rows, in source order, with schema-typed cells
    assert!(xml.contains(r#"<c r="A2" t="inlineStr"><is><t>A</t></is></c>"#));
    assert!(xml.contains(r#"<c r="B2"><v>1</v></c>"#));
    assert!(xml.contains(r#"<c r="C2"><v>10</v></c>"#));
    assert!(xml.contains(r#"<c r="A3" t="inlineStr"><is><t>B</t></is></c>"#));
    assert!(xml.contains(r#"<c r="B3"><v>2</v></c>"#));
    assert!(xml.contains(r#"<c r="C3"><v>20</v></c>"#));
    // the rejected row left no trace
    assert!(!xml.contains(r#"r="4""#));
    assert!(!xml.contains("<v>30</v>"));
    // the category column carries its dropdown over the written rows
    assert!(xml.contains(r#"<dataValidations count="1">"#));
    assert!(xml.contains(r#"sqref="B2:B3""#));
    assert!(xml.contains("<formula1>&quot;0,1,2&quot;</formula1>"));
}

#[test]
fn test_schema_surfaces_are_equivalent() {
    let legacy = "str,int,date,kbn_list1";
    let structured = r#"[
        {"width": 10, "col_type": "str",  "name": "col1"},
        {"width": 10, "col_type": "int",  "name": "col2"},
        {"width": 10, "col_type": "date", "name": "col3"},
        {"width": 10, "col_type": "kbn_list1", "kbn_values": [0, 1, 2], "name": "col4"}
    ]"#;

    let a = Schema::parse(legacy).unwrap();
    let b = Schema::parse(structured).unwrap();
    assert_eq!(a.columns(), b.columns());

    // the artifacts agree too
    let dir = TempDir::new().unwrap();
    let src = write_file(
        &dir,
        "in.csv",
        "col1,col2,col3,col4\nwidget,42,2023-07-01,1\n,0,1999/12/31,2\n",
    );
    let dst_a = dir.path().join("a.xlsx");
    let dst_b = dir.path().join("b.xlsx");
    convert(&src, &dst_a, legacy).unwrap();
    convert(&src, &dst_b, structured).unwrap();
    assert_eq!(sheet_xml(&dst_a), sheet_xml(&dst_b));
}

#[test]
fn test_row_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("id\n");
    for i in 0..200 {
        content.push_str(&format!("item{i}\n"));
    }
    let src = write_file(&dir, "in.csv", &content);
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, "str").unwrap();
    assert_eq!(report.rows_written, 200);

    let xml = sheet_xml(&dst);
    let mut last = 0;
    for i in 0..200 {
        let pos = xml.find(&format!("<t>item{i}</t>")).unwrap();
        assert!(pos > last, "item{i} appeared out of order");
        last = pos;
    }
}

#[test]
fn test_conversion_is_idempotent() {
    let schema = r#"[
        {"width": 12, "col_type": "str",  "name": "item"},
        {"width": 12, "col_type": "date", "name": "shipped"},
        {"width": 6,  "col_type": "kbn_list1", "kbn_values": ["a", "b"], "name": "grade"}
    ]"#;
    let dir = TempDir::new().unwrap();
    let src = write_file(
        &dir,
        "in.csv",
        "item,shipped,grade\nbolt,2024-02-29,a\nnut,2024-03-01,b\n",
    );
    let dst1 = dir.path().join("one.xlsx");
    let dst2 = dir.path().join("two.xlsx");

    convert(&src, &dst1, schema).unwrap();
    convert(&src, &dst2, schema).unwrap();

    assert_eq!(sheet_xml(&dst1), sheet_xml(&dst2));
    assert_eq!(
        read_part(&dst1, "xl/styles.xml"),
        read_part(&dst2, "xl/styles.xml")
    );
}

#[test]
fn test_header_only_source_yields_empty_sheet() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "name,qty\n");
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, "str,int").unwrap();
    assert_eq!(report.rows_read, 0);
    assert_eq!(report.rows_written, 0);

    let xml = sheet_xml(&dst);
    assert!(xml.contains(r#"<row r="1">"#));
    assert!(!xml.contains(r#"<row r="2">"#));
    assert!(!xml.contains("<dataValidations"));
}

#[test]
fn test_empty_source_yields_empty_sheet() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "");
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, "str,int").unwrap();
    assert_eq!(report.rows_read, 0);
    assert_eq!(report.rows_written, 0);
    assert!(dst.exists());
}

#[test]
fn test_domain_element_type_decides_membership() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "status\n2\n");
    let dst = dir.path().join("out.xlsx");

    // "2" satisfies an integer domain containing 2 and lands as a number
    let int_domain = r#"[{"width": 5, "col_type": "kbn_list1", "kbn_values": [0, 1, 2]}]"#;
    let report = convert(&src, &dst, int_domain).unwrap();
    assert_eq!(report.rows_written, 1);
    assert!(sheet_xml(&dst).contains(r#"<c r="A2"><v>2</v></c>"#));

    // the same field satisfies a text domain containing "2" and stays text
    let text_domain = r#"[{"width": 5, "col_type": "kbn_list1", "kbn_values": ["0", "1", "2"]}]"#;
    let dst_text = dir.path().join("text.xlsx");
    let report = convert(&src, &dst_text, text_domain).unwrap();
    assert_eq!(report.rows_written, 1);
    assert!(sheet_xml(&dst_text).contains(r#"<c r="A2" t="inlineStr"><is><t>2</t></is></c>"#));

    // but not an integer domain lacking it
    let missing = r#"[{"width": 5, "col_type": "kbn_list1", "kbn_values": [0, 1]}]"#;
    let dst_missing = dir.path().join("missing.xlsx");
    let report = convert(&src, &dst_missing, missing).unwrap();
    assert_eq!(report.rows_written, 0);
    assert_eq!(report.rows_rejected, 1);
}

#[test]
fn test_out_of_range_date_is_an_error_not_a_default() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "shipped\n2023-13-40\n");
    let dst = dir.path().join("out.xlsx");

    let err = Converter::new()
        .on_row_error(RowErrorPolicy::Fail)
        .run(&src, &dst, "date")
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Row {
            row: 1,
            source: RowError::InvalidDate { col: 1, .. }
        }
    ));
    assert!(!dst.exists());
}

#[test]
fn test_dates_land_as_serials_with_the_date_format() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "shipped\n1970-01-01\n2023-07-01\n");
    let dst = dir.path().join("out.xlsx");

    convert(&src, &dst, "date").unwrap();

    let xml = sheet_xml(&dst);
    assert!(xml.contains(r#"<c r="A2" s="1"><v>25569</v></c>"#));
    assert!(xml.contains(r#"<c r="A3" s="1"><v>45108</v></c>"#));
    assert!(read_part(&dst, "xl/styles.xml").contains("yyyy-mm-dd"));
}

#[test]
fn test_quoted_fields_and_embedded_newlines_survive() {
    let dir = TempDir::new().unwrap();
    let src = write_file(
        &dir,
        "in.csv",
        "note,qty\n\"first line\nsecond line\",1\n\"say \"\"hi\"\", ok\",2\n",
    );
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, "str,int").unwrap();
    assert_eq!(report.rows_written, 2);

    let xml = sheet_xml(&dst);
    assert!(xml.contains("<t>first line\nsecond line</t>"));
    assert!(xml.contains("<t>say &quot;hi&quot;, ok</t>"));
}

#[test]
fn test_large_dataset_streams_every_row() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("id,qty,shipped\n");
    for i in 0..1000 {
        content.push_str(&format!("row{},{},2024-01-15\n", i, i * 2));
    }
    let src = write_file(&dir, "in.csv", &content);
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, "str,int,date").unwrap();
    assert_eq!(report.rows_read, 1000);
    assert_eq!(report.rows_written, 1000);

    let xml = sheet_xml(&dst);
    assert_eq!(xml.matches("<row r=").count(), 1001); // header + data
    assert!(xml.contains("<t>row999</t>"));
}

#[test]
fn test_fail_fast_removes_the_partial_artifact() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("id\n");
    for i in 0..50 {
        content.push_str(&format!("{i}\n"));
    }
    content.push_str("not a number\n");
    let src = write_file(&dir, "in.csv", &content);
    let dst = dir.path().join("out.xlsx");

    let err = Converter::new()
        .on_row_error(RowErrorPolicy::Fail)
        .run(&src, &dst, "int")
        .unwrap_err();
    assert!(matches!(err, ConvertError::Row { row: 51, .. }));
    assert!(!dst.exists());
}

#[test]
fn test_rejects_file_holds_the_skipped_rows_verbatim() {
    let dir = TempDir::new().unwrap();
    let src = write_file(
        &dir,
        "in.csv",
        "note,qty\nok,1\n\"has, comma\",oops\nfine,3\n",
    );
    let dst = dir.path().join("out.xlsx");
    let rejects = dir.path().join("rejects.csv");

    let report = Converter::new()
        .reject_path(&rejects)
        .run(&src, &dst, "str,int")
        .unwrap();
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.rows_rejected, 1);
    assert_eq!(
        fs::read_to_string(&rejects).unwrap(),
        "\"has, comma\",oops\n"
    );
}

#[test]
fn test_bom_and_crlf_sources_convert_cleanly() {
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "\u{feff}name,qty\r\nwidget,7\r\n");
    let dst = dir.path().join("out.xlsx");

    let report = convert(&src, &dst, "str,int").unwrap();
    assert_eq!(report.rows_written, 1);

    let xml = sheet_xml(&dst);
    assert!(xml.contains("<t>widget</t>"));
    assert!(xml.contains(r#"<c r="B2"><v>7</v></c>"#));
}

#[test]
fn test_header_names_come_from_the_schema_not_the_source() {
    let schema = r#"[
        {"width": 8, "col_type": "str", "name": "商品"},
        {"width": 6, "col_type": "int", "name": "数量"}
    ]"#;
    let dir = TempDir::new().unwrap();
    let src = write_file(&dir, "in.csv", "whatever,labels\nitem,5\n");
    let dst = dir.path().join("out.xlsx");

    convert(&src, &dst, schema).unwrap();

    let xml = sheet_xml(&dst);
    assert!(xml.contains(r#"<c r="A1" s="2" t="inlineStr"><is><t>商品</t></is></c>"#));
    assert!(xml.contains(r#"<c r="B1" s="2" t="inlineStr"><is><t>数量</t></is></c>"#));
}
