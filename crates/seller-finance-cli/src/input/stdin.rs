use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialise piped stdin into `T`.
///
/// Returns None when stdin is a TTY or empty. The payload is parsed as YAML,
/// which also accepts plain JSON.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_payload(&buffer)
}

fn parse_payload<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: T = serde_yaml::from_str(trimmed)
        .map_err(|e| format!("Failed to parse stdin: {e}"))?;
    log::debug!("loaded input from stdin ({} bytes)", trimmed.len());
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seller_finance_core::optimizer::terms_search::SearchConstraints;

    #[test]
    fn test_empty_payload_is_none() {
        let parsed: Option<SearchConstraints> = parse_payload("  \n").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_json_payload() {
        let parsed: Option<SearchConstraints> = parse_payload(
            r#"{"listing_price": 359900, "min_down_payment_pct": 10, "max_down_payment_pct": 30,
                "min_interest_rate_pct": 1, "max_interest_rate_pct": 7,
                "monthly_rental_income": 2000, "monthly_expenses": 630,
                "balloon_years": 5, "balloon_adjustable": true}"#,
        )
        .unwrap();
        let constraints = parsed.unwrap();
        assert!(constraints.balloon_adjustable);
        assert_eq!(constraints.max_interest_rate_pct, 7);
    }

    #[test]
    fn test_malformed_payload_error() {
        let parsed: Result<Option<SearchConstraints>, _> = parse_payload("{listing_price: [");
        assert!(parsed.is_err());
    }
}
