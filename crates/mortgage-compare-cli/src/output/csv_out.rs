use serde_json::{Map, Value};
use std::io;

use super::comparison_loans;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) if comparison_loans(result).is_some() => {
                // One row per program
                if let Some(loans) = comparison_loans(result) {
                    write_rows(&mut wtr, &loans);
                }
            }
            Some(Value::Object(result)) => write_fields(&mut wtr, result),
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => {
            let rows: Vec<&Map<String, Value>> = arr.iter().filter_map(Value::as_object).collect();
            if rows.is_empty() {
                for item in arr {
                    let _ = wtr.write_record([&format_csv_value(item)]);
                }
            } else {
                write_rows(&mut wtr, &rows);
            }
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Two-column CSV: field, value
fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

/// Headers from the first row; nested objects are written as JSON.
fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[&Map<String, Value>]) {
    let Some(first) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for map in rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
