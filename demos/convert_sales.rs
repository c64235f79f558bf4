//! End-to-end demo: generate a sales CSV, convert it, report throughput

use sheetcast::{Converter, RowErrorPolicy};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

const ROWS: usize = 1_000_000;

const SCHEMA: &str = r#"[
    {"width": 10, "col_type": "str",  "name": "order_id"},
    {"width": 24, "col_type": "str",  "name": "product"},
    {"width": 8,  "col_type": "int",  "name": "quantity"},
    {"width": 12, "col_type": "int",  "name": "unit_price"},
    {"width": 12, "col_type": "date", "name": "shipped"},
    {"width": 8,  "col_type": "kbn_list1", "kbn_values": [0, 1, 2], "name": "status"}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== sheetcast demo: {} sales rows ===\n", ROWS);

    let csv_path = "/tmp/sales_demo.csv";
    let xlsx_path = "/tmp/sales_demo.xlsx";

    // === GENERATE ===
    println!("📝 Generating {}...", csv_path);
    let gen_start = Instant::now();
    {
        let mut out = BufWriter::new(File::create(csv_path)?);
        writeln!(out, "order_id,product,quantity,unit_price,shipped,status")?;
        for i in 0..ROWS {
            writeln!(
                out,
                "ORD{:07},Product {},{},{},2024-{:02}-{:02},{}",
                i,
                i % 500,
                1 + i % 9,
                980 + (i % 40) * 25,
                1 + i % 12,
                1 + i % 28,
                i % 3
            )?;
        }
        out.flush()?;
    }
    let csv_size = std::fs::metadata(csv_path)?.len();
    println!(
        "✅ Generated in {:.2}s ({:.2} MB)\n",
        gen_start.elapsed().as_secs_f64(),
        csv_size as f64 / 1_048_576.0
    );

    // === CONVERT ===
    println!("📊 Converting to {}...", xlsx_path);
    let report = Converter::new()
        .sheet_name("Sales")
        .on_row_error(RowErrorPolicy::Skip)
        .run(csv_path, xlsx_path, SCHEMA)?;

    let throughput = report.rows_written as f64 / report.elapsed.as_secs_f64();
    let xlsx_size = std::fs::metadata(xlsx_path)?.len();

    println!("✅ Conversion complete:");
    println!("   Rows read: {}", report.rows_read);
    println!("   Rows written: {}", report.rows_written);
    println!("   Rows rejected: {}", report.rows_rejected);
    println!("   Time: {:.2}s", report.elapsed.as_secs_f64());
    println!("   Throughput: {:.0} rows/sec", throughput);
    println!("   Output size: {:.2} MB", xlsx_size as f64 / 1_048_576.0);

    // Cleanup
    std::fs::remove_file(csv_path)?;
    std::fs::remove_file(xlsx_path)?;

    Ok(())
}
