use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_value, split_rows};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields form a Field/Value table; every array of row objects
/// (the amortization schedule, search passes) gets a table of its own.
pub fn print_table(value: &Value) {
    let Value::Object(envelope) = value else {
        println!("{}", value);
        return;
    };

    match envelope.get("result") {
        Some(Value::Object(result)) => print_result(result),
        _ => print_result(envelope),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_result(result: &Map<String, Value>) {
    let (scalars, row_sets) = split_rows(result);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &scalars {
        match val {
            // Flatten the chosen terms / deal summary one level
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    builder.push_record([format!("{key}.{inner_key}"), format_value(inner_val)]);
                }
            }
            Value::Null => builder.push_record([key.to_string(), "none".to_string()]),
            _ => builder.push_record([key.to_string(), format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (name, rows) in row_sets {
        println!("\n{}:", name);
        print_rows(rows);
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for row in rows.iter().filter_map(Value::as_object) {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }

    println!("{}", Table::from(builder));
}
