/// Canonical form of a column header: byte-order mark removed, surrounding
/// whitespace trimmed, lower-cased.
///
/// Sources authored independently disagree on casing (`AppID`, `appid`) and
/// sometimes pad headers with spaces, so every lookup goes through this.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}
