use serde_json::{Map, Value};
use std::io;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Lists become one row per item. A result with a per-level breakdown is
/// written as one row per level; other results as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            if let Some(Value::Object(levels)) = body.get("per_level") {
                write_keyed_csv(&mut wtr, "level", levels);
            } else if let Some(Value::Array(points)) = body.get("points") {
                write_array_csv(&mut wtr, points);
            } else {
                write_pairs_csv(&mut wtr, body);
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_pairs_csv(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_keyed_csv(wtr: &mut StdoutWriter<'_>, key_column: &str, map: &Map<String, Value>) {
    let Some(Value::Object(first)) = map.values().next() else {
        return;
    };
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut header = vec![key_column];
    header.extend(columns.iter().copied());
    let _ = wtr.write_record(&header);

    for (row_key, row) in map {
        if let Value::Object(fields) = row {
            let mut record = vec![row_key.clone()];
            record.extend(
                columns
                    .iter()
                    .map(|c| fields.get(*c).map(format_csv_value).unwrap_or_default()),
            );
            let _ = wtr.write_record(&record);
        }
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        // Nested series (monthly, top companies) do not fit a flat row
        let headers: Vec<&str> = first
            .iter()
            .filter(|(_, v)| !v.is_array() && !v.is_object())
            .map(|(k, _)| k.as_str())
            .collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
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
