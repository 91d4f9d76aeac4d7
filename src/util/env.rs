//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to the crate root when launched from elsewhere
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        Err(_) => default,
    }
}

/// Comma-separated list; blank entries are skipped. None if unset or empty.
pub fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = env_opt(key)?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_falls_back() {
        std::env::set_var("CATALOG_TEST_TOP_N", " 25 ");
        assert_eq!(env_parse("CATALOG_TEST_TOP_N", 15usize), 25);
        std::env::set_var("CATALOG_TEST_TOP_N", "many");
        assert_eq!(env_parse("CATALOG_TEST_TOP_N", 15usize), 15);
        assert_eq!(env_parse("CATALOG_TEST_UNSET_KEY", 7u32), 7);
    }

    #[test]
    fn flags_accept_common_spellings() {
        std::env::set_var("CATALOG_TEST_FLAG", "Yes");
        assert!(env_flag("CATALOG_TEST_FLAG", false));
        std::env::set_var("CATALOG_TEST_FLAG", "0");
        assert!(!env_flag("CATALOG_TEST_FLAG", true));
        assert!(env_flag("CATALOG_TEST_UNSET_FLAG", true));
    }

    #[test]
    fn lists_skip_blank_entries() {
        std::env::set_var("CATALOG_TEST_LIST", " -1, 0,, 5 ");
        assert_eq!(
            env_list("CATALOG_TEST_LIST"),
            Some(vec!["-1".to_string(), "0".to_string(), "5".to_string()])
        );
        std::env::set_var("CATALOG_TEST_EMPTY_LIST", " , ");
        assert_eq!(env_list("CATALOG_TEST_EMPTY_LIST"), None);
        assert_eq!(env_opt("CATALOG_TEST_UNSET_KEY"), None);
    }
}
