//! Developer utility to print the column summary of a dataset as JSON.

use std::path::PathBuf;

use churnlens::dataset::{load_records, summarize};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let path = parse_args(std::env::args().skip(1).collect())?;
    let records = load_records(&path).map_err(|err| err.to_string())?;
    let summary = summarize(&records);
    let text = serde_json::to_string_pretty(&summary).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<PathBuf, String> {
    match args.as_slice() {
        [flag] if flag == "-h" || flag == "--help" => Err(help_text()),
        [path] => Ok(PathBuf::from(path)),
        _ => Err(help_text()),
    }
}

fn help_text() -> String {
    [
        "churnlens-summary",
        "",
        "Prints column names, missing counts, types and statistics of a dataset.",
        "",
        "Usage:",
        "  churnlens-summary <dataset.csv|dataset.json>",
    ]
    .join("\n")
}
