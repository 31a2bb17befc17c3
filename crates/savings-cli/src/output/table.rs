use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
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
    if let Value::Object(res_map) = result {
        print_object(res_map);
    } else {
        print_flat_object(envelope);
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

/// Scalar fields as a Field/Value table, then one sub-table per nested
/// collection (per-level details, curve points, monthly series).
fn print_object(map: &Map<String, Value>) {
    print_flat_object(map);
    for (key, val) in map {
        match val {
            Value::Array(arr) if is_nested(val) => {
                println!("\n{}:", key);
                print_array_table(arr);
            }
            Value::Object(inner) if is_nested(val) => {
                println!("\n{}:", key);
                print_keyed_table(inner);
            }
            _ => {}
        }
    }
}

fn is_nested(val: &Value) -> bool {
    match val {
        Value::Array(arr) => arr.iter().any(Value::is_object),
        Value::Object(inner) => !inner.is_empty() && inner.values().all(Value::is_object),
        _ => false,
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if is_nested(val) {
            continue;
        }
        builder.push_record([key.as_str(), &format_field(key, val)]);
    }
    let table = Table::from(builder);
    println!("{}", table);
}

/// Rows keyed by the outer map (e.g. investment level), columns from the
/// first row.
fn print_keyed_table(map: &Map<String, Value>) {
    let Some(Value::Object(first)) = map.values().next() else {
        return;
    };
    let columns: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(columns.iter().cloned());
    builder.push_record(header);

    for (row_key, row) in map {
        if let Value::Object(fields) = row {
            let mut record = vec![row_key.clone()];
            record.extend(columns.iter().map(|c| {
                fields
                    .get(c.as_str())
                    .map(|v| format_field(c, v))
                    .unwrap_or_default()
            }));
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| !is_nested(v))
            .map(|(k, _)| k.clone())
            .collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_field(h, v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));

        // Nested collections of each row (e.g. a bank's monthly series)
        for item in arr {
            if let Value::Object(map) = item {
                let label = map
                    .values()
                    .find_map(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                for (key, val) in map {
                    if let Value::Array(inner) = val {
                        if is_nested(val) {
                            println!("\n{} {}:", label, key);
                            print_array_table(inner);
                        }
                    }
                }
            }
        }
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Dollar amounts are shown compactly; everything else as-is.
fn format_field(key: &str, value: &Value) -> String {
    if is_money_field(key) {
        let parsed = match value {
            Value::String(s) => Decimal::from_str(s).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        if let Some(amount) = parsed {
            return compact_money(amount);
        }
    }
    format_value(value)
}

fn is_money_field(key: &str) -> bool {
    key.contains("savings") || key == "hourly_rate"
}

/// `$950`, `$36K`, `$1.2M`, `$3.4B`.
pub fn compact_money(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = amount.abs();
    let thousand = Decimal::from(1_000);
    let million = Decimal::from(1_000_000);
    let billion = Decimal::from(1_000_000_000);

    if abs >= billion {
        format!("{sign}${}B", (abs / billion).round_dp(1))
    } else if abs >= million {
        format!("{sign}${}M", (abs / million).round_dp(1))
    } else if abs >= thousand {
        format!("{sign}${}K", (abs / thousand).round())
    } else {
        format!("{sign}${}", abs.round())
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_compact_money_units() {
        assert_eq!(compact_money(dec!(950)), "$950");
        assert_eq!(compact_money(dec!(36_400)), "$36K");
        assert_eq!(compact_money(dec!(1_234_567)), "$1.2M");
        assert_eq!(compact_money(dec!(3_400_000_000)), "$3.4B");
        assert_eq!(compact_money(dec!(-35_022.4)), "-$35K");
        assert_eq!(compact_money(Decimal::ZERO), "$0");
    }

    #[test]
    fn test_money_fields_are_compacted() {
        assert_eq!(format_field("total_savings", &json!("1234567.891")), "$1.2M");
        assert_eq!(format_field("percentage", &json!("68.18")), "68.18");
        assert_eq!(format_field("companies", &json!(12)), "12");
    }

    #[test]
    fn test_nested_detection() {
        assert!(is_nested(&json!({"seed": {"companies": 3}})));
        assert!(is_nested(&json!([{"month": "2024-01"}])));
        assert!(!is_nested(&json!({"seed": 3})));
        assert!(!is_nested(&json!([])));
    }
}
