use serde_json::{Map, Value};
use std::io;

use super::{format_value, row_headers, ROW_KEYS};

/// Write output as CSV to stdout.
///
/// A result carrying a ledger is written one row per line item; any other
/// result is written as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match ledger_rows(result) {
                Some(rows) => write_array_csv(&mut wtr, rows),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in result {
                        let _ = wtr.write_record([key.as_str(), &format_value(val, "")]);
                    }
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_value(value, "")]);
        }
    }

    let _ = wtr.flush();
}

fn ledger_rows(result: &Map<String, Value>) -> Option<&[Value]> {
    ROW_KEYS[..2].iter().find_map(|key| match result.get(*key) {
        Some(Value::Array(rows)) => Some(rows.as_slice()),
        _ => None,
    })
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if let Some(Value::Object(_)) = arr.first() {
        let headers = row_headers(arr);
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(|v| format_value(v, "")).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_value(item, "")]);
        }
    }
}
