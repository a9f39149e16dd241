//! Output formatting for the CLI.

use clap::ValueEnum;
use homeops_sync::Record;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "success", "message": message }));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "status": "error", "message": message }));
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<20} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(72));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// One line per entry: date, category, title, value and notes.
pub fn format_record(record: &Record) -> String {
    let mut line = format!(
        "{}  {:<11}  {}",
        record.created_at.format("%Y-%m-%d"),
        record.category.as_str(),
        record.title
    );
    if let Some(value) = record.value {
        line.push_str(&format!("  ({})", value));
    }
    if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
        line.push_str(&format!("  - {}", notes));
    }
    line
}

pub fn print_records(records: &[Record], format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            print_heading(&format!("Entries ({})", records.len()));
            if records.is_empty() {
                println!("  No entries yet");
            }
            for record in records {
                println!("  {}", format_record(record));
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(records) {
            Ok(json) => println!("{}", json),
            Err(e) => print_error(&format!("Failed to encode entries: {}", e), format),
        },
    }
}
