//! Heap profiling for a large conversion
//!
//! Run with `--features dhat-heap` and inspect the dhat-heap.json output in
//! the dhat viewer. Peak heap should stay flat as ROWS grows.

use sheetcast::convert;
use std::fs::File;
use std::io::{BufWriter, Write};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

const ROWS: usize = 200_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _profiler = dhat::Profiler::new_heap();

    let csv_path = "/tmp/memory_profile.csv";
    let xlsx_path = "/tmp/memory_profile.xlsx";

    println!("📝 Generating {} rows...", ROWS);
    {
        let mut out = BufWriter::new(File::create(csv_path)?);
        writeln!(out, "id,name,value,shipped,status")?;
        for i in 0..ROWS {
            writeln!(
                out,
                "{},Name_{},{},2024-06-01,{}",
                i,
                i,
                i * 100,
                i % 3
            )?;
        }
        out.flush()?;
    }

    println!("📊 Converting...");
    let report = convert(
        csv_path,
        xlsx_path,
        "str,str,int,date,kbn_list1",
    )?;

    println!("✅ {} rows written in {:.2}s", report.rows_written, report.elapsed.as_secs_f64());
    println!("   Heap stats land in dhat-heap.json on exit");

    std::fs::remove_file(csv_path)?;
    std::fs::remove_file(xlsx_path)?;

    Ok(())
}
