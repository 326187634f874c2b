use serde_json::Value;

use super::format_value;

/// Print just the key answer value from the output: the APR, the inferred
/// period, or the final balance of an amortization pass.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["apr", "period", "final_balance"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_value(val, "null"));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val, "null"));
            return;
        }
    }

    println!("{}", format_value(result_obj, "null"));
}
