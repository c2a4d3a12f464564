//! Parsing of the site's rendered date text.
//!
//! `.odate` spans render like `27 Jun 2010 17:04`, sometimes with a comma
//! before the time, sometimes date-only, and history cells embed literal
//! newline/tab runs. Whitespace is collapsed before matching.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATETIME_FORMATS: [&str; 3] = ["%d %b %Y %H:%M:%S", "%d %b %Y %H:%M", "%d %b %Y, %H:%M"];
const DATE_FORMAT: &str = "%d %b %Y";

/// Parse rendered odate text into a UTC timestamp. Date-only text maps to
/// midnight.
pub fn parse_odate(text: &str) -> Option<DateTime<Utc>> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(Utc.from_utc_datetime(&datetime));
        }
    }

    NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| Utc.from_utc_datetime(&datetime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_datetime() {
        let parsed = parse_odate("27 Jun 2010 17:04").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2010-06-27T17:04:00+00:00");
    }

    #[test]
    fn test_parses_datetime_with_comma() {
        let parsed = parse_odate("27 Jun 2010, 17:04").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2010-06-27T17:04:00+00:00");
    }

    #[test]
    fn test_parses_date_only_as_midnight() {
        let parsed = parse_odate("10 Aug 2008").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2008-08-10T00:00:00+00:00");
    }

    #[test]
    fn test_collapses_embedded_whitespace() {
        let parsed = parse_odate("\n\t\t30 Jun 2010   14:35").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2010-06-30T14:35:00+00:00");
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_odate(""), None);
        assert_eq!(parse_odate("   "), None);
        assert_eq!(parse_odate("yesterday"), None);
        assert_eq!(parse_odate("32 Jun 2010 17:04"), None);
    }
}
