//! Parsing and formatting of comma-grouped display numbers.
//!
//! Every numeric value that crosses the form/wire boundary goes through
//! here: malformed input degrades to a default instead of erroring.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses a display string that may contain comma thousands separators.
/// Empty, non-numeric, or non-finite input yields `default`.
pub fn parse_formatted_number(input: &str, default: f64) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return default;
    }
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => default,
    }
}

/// Formats a number with comma thousands grouping and no enforced decimal
/// places: `1234.5` becomes `"1,234.5"`. Non-finite input yields an empty
/// string.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    group_decimal(&value.to_string())
}

/// Formats a currency amount with grouping and exactly two decimals.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    group_decimal(&format!("{value:.2}"))
}

fn group_decimal(raw: &str) -> String {
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Serde deserializer for numeric wire fields that may arrive as a JSON
/// number, a grouped display string, or null. Anything else normalizes to 0.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_formatted_number(&s, 0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grouped_strings() {
        assert_eq!(parse_formatted_number("1,234,567.89", 0.0), 1_234_567.89);
        assert_eq!(parse_formatted_number("  2,500 ", 0.0), 2500.0);
        assert_eq!(parse_formatted_number("42", 0.0), 42.0);
    }

    #[test]
    fn malformed_input_degrades_to_default() {
        assert_eq!(parse_formatted_number("", 0.0), 0.0);
        assert_eq!(parse_formatted_number("   ", 7.0), 7.0);
        assert_eq!(parse_formatted_number("abc", 0.0), 0.0);
        assert_eq!(parse_formatted_number("12abc", 3.0), 3.0);
        assert_eq!(parse_formatted_number("NaN", 1.0), 1.0);
        assert_eq!(parse_formatted_number("inf", 1.0), 1.0);
    }

    #[test]
    fn formats_with_grouping() {
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-1234567.25), "-1,234,567.25");
        assert_eq!(format_number(f64::NAN), "");
    }

    #[test]
    fn currency_always_has_two_decimals() {
        assert_eq!(format_currency(1234.5), "1,234.50");
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(-99.999), "-100.00");
    }

    #[test]
    fn round_trip_is_exact() {
        for x in [0.0, 1.0, 999.0, 1000.0, 1234.5, 1_234_567.89, 0.125] {
            assert_eq!(parse_formatted_number(&format_number(x), -1.0), x);
        }
    }

    #[test]
    fn triple_round_trip_is_stable() {
        for s in ["1,234.5", "42", "1,000,000", "0.25"] {
            let once = parse_formatted_number(s, 0.0);
            let again = parse_formatted_number(&format_number(once), 0.0);
            assert_eq!(again, once);
        }
    }

    #[test]
    fn lenient_deserializer_covers_all_shapes() {
        #[derive(serde::Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "lenient_number")]
            value: f64,
        }

        let cases = [
            (r#"{"value": 12.5}"#, 12.5),
            (r#"{"value": "1,200"}"#, 1200.0),
            (r#"{"value": ""}"#, 0.0),
            (r#"{"value": null}"#, 0.0),
            (r#"{"value": "junk"}"#, 0.0),
            (r#"{"value": true}"#, 0.0),
            (r#"{}"#, 0.0),
        ];
        for (json, expected) in cases {
            let holder: Holder = serde_json::from_str(json).unwrap();
            assert_eq!(holder.value, expected, "for {json}");
        }
    }
}
