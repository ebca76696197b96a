pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Program order used for every per-program listing.
const PROGRAM_ORDER: [&str; 5] = ["conventional", "fha", "va", "usda", "arm"];

/// Per-program rows of a comparison result, if `result` is one.
pub fn comparison_loans(result: &Value) -> Option<Vec<&serde_json::Map<String, Value>>> {
    let loans = result.get("loans")?.as_object()?;
    let rows: Vec<_> = PROGRAM_ORDER
        .iter()
        .filter_map(|key| loans.get(*key).and_then(Value::as_object))
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}
