//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => print_json(&items, "[]"),
    }
}

/// Print a single record: key/value lines for tables, pretty JSON otherwise
pub fn print_record<T: Serialize>(fields: &[(&str, String)], item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            for (key, value) in fields {
                print_kv(key, value);
            }
        }
        OutputFormat::Json => print_json(item, "{}"),
    }
}

/// Print any serializable value as JSON, whatever the format
pub fn print_json<T: Serialize + ?Sized>(item: &T, fallback: &str) {
    let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| fallback.to_string());
    println!("{json}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

/// Render an optional value, `-` when absent
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
