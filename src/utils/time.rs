use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;

/// Format Gradescope writes into `<time datetime="...">`
const GRADESCOPE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Same as above without seconds, seen on older course pages
const GRADESCOPE_SHORT_FORMAT: &str = "%Y-%m-%d %H:%M %z";

/// Parse a due timestamp.
///
/// Accepts RFC 3339 and the Gradescope attribute form. The original offset is
/// kept; equality between two results compares instants.
pub fn parse_due_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, GRADESCOPE_FORMAT))
        .or_else(|_| DateTime::parse_from_str(raw, GRADESCOPE_SHORT_FORMAT))
        .ok()
}

/// Render a due instant for the run summary
pub fn format_due(due: &DateTime<FixedOffset>, tz: &Tz) -> String {
    tz.from_utc_datetime(&due.naive_utc())
        .format("%a %Y-%m-%d %H:%M %Z")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let due = parse_due_at("2026-01-24T16:00:00-08:00").unwrap();
        assert_eq!(due.offset().local_minus_utc(), -8 * 3600);
        assert_eq!(due.to_rfc3339(), "2026-01-24T16:00:00-08:00");
    }

    #[test]
    fn test_parse_gradescope_format() {
        let a = parse_due_at("2026-01-24 16:00:00 -0800").unwrap();
        let b = parse_due_at("2026-01-24T16:00:00-08:00").unwrap();
        assert_eq!(a, b);

        let short = parse_due_at("2026-01-24 16:00 -0800").unwrap();
        assert_eq!(short, b);
    }

    #[test]
    fn test_same_instant_different_offsets_equal() {
        let pacific = parse_due_at("2026-01-24T16:00:00-08:00").unwrap();
        let utc = parse_due_at("2026-01-25T00:00:00Z").unwrap();
        assert_eq!(pacific, utc);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_due_at("").is_none());
        assert!(parse_due_at("   ").is_none());
        assert!(parse_due_at("next friday").is_none());
        assert!(parse_due_at("2026-13-45T99:00:00Z").is_none());
    }

    #[test]
    fn test_format_due_in_timezone() {
        let due = parse_due_at("2026-01-24T16:00:00-08:00").unwrap();
        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        assert_eq!(format_due(&due, &tz), "Sun 2026-01-25 02:00 EET");
    }
}
