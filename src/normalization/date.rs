use chrono::{Datelike, NaiveDate};

/// Day-first and month-first layouts seen in store exports.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d %b, %Y", "%b %d, %Y", "%d %b %Y"];

/// Parse a release date cell. Unrecognized layouts yield `None`.
///
/// Month-only (`"Nov 2012"`) and year-only (`"2012"`) values resolve to the
/// first day of that period.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {trimmed}"), "%d %b %Y") {
        return Some(date);
    }
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let year = trimmed.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

pub fn release_year(raw: &str) -> Option<i32> {
    parse_release_date(raw).map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_layouts() {
        let expected = NaiveDate::from_ymd_opt(2012, 8, 21);
        assert_eq!(parse_release_date("2012-08-21"), expected);
        assert_eq!(parse_release_date("21 Aug, 2012"), expected);
        assert_eq!(parse_release_date("Aug 21, 2012"), expected);
        assert_eq!(parse_release_date("Nov 2012"), NaiveDate::from_ymd_opt(2012, 11, 1));
        assert_eq!(parse_release_date("1998"), NaiveDate::from_ymd_opt(1998, 1, 1));
    }

    #[test]
    fn unknown_layouts_are_none() {
        assert_eq!(parse_release_date("coming soon"), None);
        assert_eq!(parse_release_date("2012/13/45"), None);
        assert_eq!(release_year(""), None);
    }

    #[test]
    fn extracts_year() {
        assert_eq!(release_year("2019-03-01"), Some(2019));
    }
}
