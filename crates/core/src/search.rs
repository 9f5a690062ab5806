//! Pagination bounds and search-input helpers shared by list endpoints.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default page size for admin list endpoints.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Maximum page size for admin list endpoints.
pub const MAX_PAGE_LIMIT: i64 = 200;

/// Default number of location suggestions.
pub const DEFAULT_LOCATION_LIMIT: i64 = 10;

/// Maximum number of location suggestions.
pub const MAX_LOCATION_LIMIT: i64 = 25;

/// Minimum query length before a location search runs.
pub const MIN_LOCATION_QUERY_LEN: usize = 2;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Location search
// ---------------------------------------------------------------------------

/// How a location search string should be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationQuery {
    /// All-digit input: match zip codes by prefix.
    ZipPrefix(String),
    /// Anything else: match city names by case-insensitive prefix, with an
    /// optional two-letter state filter (`"Austin, TX"`).
    City { name: String, state: Option<String> },
}

/// Classify raw search input. Returns `None` for input too short to search.
pub fn parse_location_query(raw: &str) -> Option<LocationQuery> {
    let q = raw.trim();
    if q.chars().count() < MIN_LOCATION_QUERY_LEN {
        return None;
    }

    if q.chars().all(|c| c.is_ascii_digit()) {
        return Some(LocationQuery::ZipPrefix(q.chars().take(5).collect()));
    }

    let (name, state) = match q.split_once(',') {
        Some((city, st)) => {
            let st = st.trim();
            let state = (st.len() == 2 && st.chars().all(|c| c.is_ascii_alphabetic()))
                .then(|| st.to_ascii_uppercase());
            (city.trim(), state)
        }
        None => (q, None),
    };

    let name = escape_like(name);
    if name.is_empty() {
        return None;
    }
    Some(LocationQuery::City { name, state })
}

/// Escape `LIKE` wildcards so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None, 50, 200), 50);
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
        assert_eq!(clamp_limit(Some(500), 50, 200), 200);
    }

    #[test]
    fn offset_is_non_negative() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-5)), 0);
        assert_eq!(clamp_offset(Some(20)), 20);
    }

    #[test]
    fn digits_are_zip_prefix() {
        assert_eq!(
            parse_location_query("902"),
            Some(LocationQuery::ZipPrefix("902".into()))
        );
        assert_eq!(
            parse_location_query("9021099"),
            Some(LocationQuery::ZipPrefix("90210".into()))
        );
    }

    #[test]
    fn text_is_city_with_optional_state() {
        assert_eq!(
            parse_location_query("Austin, tx"),
            Some(LocationQuery::City {
                name: "Austin".into(),
                state: Some("TX".into())
            })
        );
        assert_eq!(
            parse_location_query("San Jo"),
            Some(LocationQuery::City {
                name: "San Jo".into(),
                state: None
            })
        );
    }

    #[test]
    fn short_input_is_ignored() {
        assert_eq!(parse_location_query(" a "), None);
        assert_eq!(parse_location_query(""), None);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
