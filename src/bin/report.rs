#![cfg(not(tarpaulin_include))]

use feedback::aggregate::{HeaderRow, summarize_with};
use feedback::import::read_csv;
use feedback::schema::FeedbackCategory;
use feedback::store::{FileStore, RowStore};
use std::env;
use std::path::Path;

/// Print the dashboard snapshot of a file store directory or a downloaded CSV sheet
///
/// Usage: `feedback_report <store-dir | overall.csv> [--header]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(source) = args.get(1) else {
        eprintln!("Usage: {} <store-dir | overall.csv> [--header]", args[0]);
        return Ok(());
    };
    let header = if args.iter().skip(2).any(|a| a == "--header") {
        HeaderRow::Present
    } else {
        HeaderRow::Absent
    };

    let path = Path::new(source);
    let rows = if path.is_dir() {
        FileStore::open(path)?.fetch_all(FeedbackCategory::Overall).await?
    } else {
        read_csv(path)?
    };

    let snapshot = summarize_with(&rows, header);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
