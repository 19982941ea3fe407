pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Split a result object into its scalar fields and its arrays of row objects
/// (e.g. the amortization schedule).
pub(crate) fn split_rows(map: &Map<String, Value>) -> (Vec<(&str, &Value)>, Vec<(&str, &[Value])>) {
    let mut scalars = Vec::new();
    let mut row_sets = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                row_sets.push((key.as_str(), items.as_slice()));
            }
            _ => scalars.push((key.as_str(), val)),
        }
    }
    (scalars, row_sets)
}

/// Render a scalar cell; decimals arrive as strings and nested objects as JSON.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
