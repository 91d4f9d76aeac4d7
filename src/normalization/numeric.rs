/// Parse a numeric cell. Returns `None` for anything that is not a finite
/// number so malformed values drop out of ranges and means instead of
/// failing the computation.
///
/// Accepts a leading currency symbol and thousands separators
/// (`"$1,299.99"`), which show up in scraped price columns.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed
        .strip_prefix(&['$', '€', '£'][..])
        .unwrap_or(trimmed)
        .trim_start();
    if unsigned.is_empty() {
        return None;
    }
    let cleaned: String = unsigned.chars().filter(|c| *c != ',' && *c != '_').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Canonical join key. Identifiers exported through spreadsheets often turn
/// into floats (`"10.0"`), so integral floats collapse to their integer form;
/// everything else is only trimmed.
pub fn normalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((int_part, frac)) = trimmed.split_once('.') {
        let digits_only = !int_part.is_empty()
            && int_part.chars().all(|c| c.is_ascii_digit())
            && frac.chars().all(|c| c == '0');
        if digits_only {
            return Some(int_part.to_string());
        }
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_currency_values() {
        assert_eq!(parse_number("7.19"), Some(7.19));
        assert_eq!(parse_number(" 0 "), Some(0.0));
        assert_eq!(parse_number("$1,299.50"), Some(1299.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
    }

    #[test]
    fn malformed_values_are_none() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("free"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn keys_collapse_integral_floats() {
        assert_eq!(normalize_key("10").as_deref(), Some("10"));
        assert_eq!(normalize_key(" 10.0 ").as_deref(), Some("10"));
        assert_eq!(normalize_key("10.5").as_deref(), Some("10.5"));
        assert_eq!(normalize_key("abc.0").as_deref(), Some("abc.0"));
        assert_eq!(normalize_key("   "), None);
    }
}
