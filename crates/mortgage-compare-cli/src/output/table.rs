use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::comparison_loans;

/// Rows of the side-by-side comparison grid: (label, loan field).
const COMPARISON_ROWS: [(&str, &str); 11] = [
    ("Rate %", "rate"),
    ("Principal & interest", "monthly_pi"),
    ("Mortgage insurance", "monthly_mi"),
    ("Monthly payment", "monthly_payment"),
    ("Upfront MI", "upfront_mi"),
    ("Closing costs", "closing_costs"),
    ("Cash to close", "cash_to_close"),
    ("5-year cost", "cost_60_month"),
    ("Lifetime cost", "lifetime_cost"),
    ("MI months", "mi_months"),
    ("MI ends", "mi_end_date"),
];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Some(loans) = comparison_loans(result) {
        print_comparison(result, &loans);
    } else if let Value::Object(res_map) = result {
        print_field_table(res_map);
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Object(property)) = envelope.get("property") {
        println!("\nProperty:");
        print_field_table(property);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// One column per program, one row per cost line.
fn print_comparison(result: &Value, loans: &[&Map<String, Value>]) {
    if let Value::Object(summary) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in summary {
            if key != "loans" && key != "best" {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
        }
        println!("{}", Table::from(builder));
    }

    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(loans.iter().map(|l| field(l, "name")));
    builder.push_record(header);

    for (label, key) in COMPARISON_ROWS {
        let mut row = vec![label.to_string()];
        row.extend(loans.iter().map(|l| field(l, key)));
        builder.push_record(row);
    }
    println!("\n{}", Table::from(builder));

    let arm = loans
        .iter()
        .find_map(|l| l.get("arm_scenarios").and_then(Value::as_object));
    if let Some(arm) = arm {
        let mut builder = Builder::default();
        builder.push_record(["ARM scenario", "Rate %", "Monthly payment"]);
        for (label, key) in [
            ("Initial", "initial"),
            ("Best case", "best_case"),
            ("Likely", "likely"),
            ("Worst case", "worst_case"),
        ] {
            if let Some(Value::Object(s)) = arm.get(key) {
                builder.push_record([label.to_string(), field(s, "rate"), field(s, "monthly_payment")]);
            }
        }
        println!("\n{}", Table::from(builder));
    }

    if let Some(Value::Object(best)) = result.get("best") {
        println!("\nBest:");
        for (metric, loan_type) in best {
            println!("  {}: {}", metric, format_value(loan_type));
        }
    }
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        print_field_table(map);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers.iter().map(|h| field(map, h)).collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key).map(format_value).unwrap_or_default()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
