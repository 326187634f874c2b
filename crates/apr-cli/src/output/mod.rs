pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;
use std::collections::BTreeSet;

/// Result fields holding per-item rows rather than scalars.
pub const ROW_KEYS: [&str; 4] = ["line_items", "entries", "iteration_trace", "tallies"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a scalar JSON value for text output; `null` renders as `null_text`.
pub fn format_value(value: &Value, null_text: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null_text.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Column headers for a list of object rows: every key that appears in any row.
///
/// Rows may omit optional fields, so the first row alone is not enough.
pub fn row_headers(rows: &[Value]) -> Vec<&str> {
    let keys: BTreeSet<&str> = rows
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|map| map.keys().map(String::as_str))
        .collect();
    keys.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_headers_cover_every_row() {
        let rows = vec![
            json!({"kind": "disbursement", "amount": "1000"}),
            json!({"kind": "payment", "amount": "88.85", "recurrence_period": "1M"}),
        ];
        assert_eq!(row_headers(&rows), vec!["amount", "kind", "recurrence_period"]);
        assert!(row_headers(&[json!(1), json!("x")]).is_empty());
    }
}
