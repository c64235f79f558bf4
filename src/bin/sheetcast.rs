//! Command-line front end for sheetcast
//!
//! Usage:
//!   sheetcast <input.csv> <output.xlsx> <schema-file>
//!   sheetcast data.csv out.xlsx schema.json --rejects bad.csv
//!
//! The schema file holds either a JSON array of column definitions or the
//! compact comma-separated type list (`str,int,date,kbn_list1`).

use std::env;
use std::fs;
use std::process;

use sheetcast::{Converter, RowErrorPolicy};

fn print_usage() {
    eprintln!("Usage: sheetcast <input.csv> <output.xlsx> <schema-file> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-header         treat the first record as data, not a header");
    eprintln!("  --fail-fast         abort on the first row that fails coercion");
    eprintln!("  --rejects <path>    write skipped rows, verbatim, to a CSV file");
    eprintln!("  --delimiter <char>  single-byte field delimiter (default ,)");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        print_usage();
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let schema_path = &args[3];

    let mut converter = Converter::new();
    let mut i = 4;
    while i < args.len() {
        match args[i].as_str() {
            "--no-header" => converter = converter.has_header(false),
            "--fail-fast" => converter = converter.on_row_error(RowErrorPolicy::Fail),
            "--rejects" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    eprintln!("Error: --rejects needs a file path");
                    process::exit(1);
                };
                converter = converter.reject_path(path);
            }
            "--delimiter" => {
                i += 1;
                let delim = match args.get(i).map(String::as_bytes) {
                    Some([byte]) => *byte,
                    _ => {
                        eprintln!("Error: --delimiter needs a single byte character");
                        process::exit(1);
                    }
                };
                converter = converter.delimiter(delim);
            }
            other => {
                eprintln!("Error: unknown option {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let schema_document = match fs::read_to_string(schema_path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error reading {}: {}", schema_path, e);
            process::exit(1);
        }
    };

    let report = match converter.run(input_path, output_path, &schema_document) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Converted {} -> {} in {:.2}s",
        input_path,
        output_path,
        report.elapsed.as_secs_f64()
    );
    println!(
        "  rows read: {}  written: {}  rejected: {}",
        report.rows_read, report.rows_written, report.rows_rejected
    );
    for issue in &report.issues {
        eprintln!("  row {}: {}", issue.row, issue.error);
    }
    if report.rows_rejected as usize > report.issues.len() {
        eprintln!(
            "  ... and {} more rejected rows",
            report.rows_rejected as usize - report.issues.len()
        );
    }
}
