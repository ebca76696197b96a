use serde_json::Value;

use super::comparison_loans;

/// Print just the key answer value from the output.
///
/// A comparison prints the program with the lowest monthly payment.
/// Otherwise look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(line) = best_payment(result_obj) {
        println!("{}", line);
        return;
    }

    let priority_keys = [
        "monthly_payment",
        "recommended_monthly_payment",
        "total",
        "suggestions",
        "worst_case",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

/// `USDA 1895.11` for a comparison result.
fn best_payment(result: &Value) -> Option<String> {
    let best = result.get("best")?.get("monthly_payment")?.as_str()?;
    let loan = comparison_loans(result)?
        .into_iter()
        .find(|l| l.get("loan_type").and_then(Value::as_str) == Some(best))?;
    Some(format!(
        "{} {}",
        format_minimal(loan.get("name")?),
        format_minimal(loan.get("monthly_payment")?)
    ))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
