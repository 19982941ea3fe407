use serde_json::{Map, Value};
use std::io;

use super::{format_value, split_rows};

/// Write output as CSV to stdout.
///
/// A result carrying row arrays (the amortization schedule) is written as
/// those rows; otherwise as two-column field,value records.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => result,
            _ => map,
        },
        _ => {
            let _ = wtr.write_record([format_value(value)]);
            let _ = wtr.flush();
            return;
        }
    };

    let (scalars, row_sets) = split_rows(result);
    match row_sets.iter().find(|(name, _)| *name == "schedule").or(row_sets.first()) {
        Some((_, rows)) => write_rows(&mut wtr, rows),
        None => write_fields(&mut wtr, &scalars),
    }

    let _ = wtr.flush();
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, scalars: &[(&str, &Value)]) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in scalars {
        if let Value::Object(inner) = val {
            write_nested(wtr, key, inner);
        } else {
            let _ = wtr.write_record([key.to_string(), format_value(val)]);
        }
    }
}

fn write_nested<W: io::Write>(wtr: &mut csv::Writer<W>, prefix: &str, inner: &Map<String, Value>) {
    for (key, val) in inner {
        let _ = wtr.write_record([format!("{prefix}.{key}"), format_value(val)]);
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(format_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(f: impl FnOnce(&mut csv::Writer<Vec<u8>>)) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        f(&mut wtr);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_use_first_row_headers() {
        let rows = vec![
            json!({ "month": 1, "payment": "1500" }),
            json!({ "month": 2, "payment": "1500" }),
        ];
        let out = render(|w| write_rows(w, &rows));
        assert_eq!(out, "month,payment\n1,1500\n2,1500\n");
    }

    #[test]
    fn test_fields_flatten_nested_terms() {
        let result = json!({
            "optimal_terms": { "offer_price": "338920" },
            "used_fallback": true
        });
        let (scalars, _) = split_rows(result.as_object().unwrap());
        let out = render(|w| write_fields(w, &scalars));
        assert_eq!(out, "field,value\noptimal_terms.offer_price,338920\nused_fallback,true\n");
    }
}
