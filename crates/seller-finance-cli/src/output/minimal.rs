use serde_json::Value;

use super::format_value;

/// Print just the headline figure of a result.
///
/// Search results print the chosen terms on one line (or a no-terms notice);
/// schedules and balloon valuations print the first headline field present.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return format_value(result_obj);
    };

    if let Some(terms) = map.get("optimal_terms") {
        return match terms {
            Value::Object(t) => {
                let field = |k: &str| t.get(k).map(format_value).unwrap_or_default();
                format!(
                    "offer {} | down {}% | rate {}% | balloon {}y | seller earnings {}",
                    field("offer_price"),
                    field("down_payment_pct"),
                    field("interest_rate_pct"),
                    field("balloon_years"),
                    field("seller_earnings"),
                )
            }
            _ => "no feasible terms".to_string(),
        };
    }

    let priority_keys = ["monthly_payment", "remaining_balance", "balloon_amount"];
    for key in &priority_keys {
        if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
            return format_value(val);
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_value(val)),
        None => String::new(),
    }
}
