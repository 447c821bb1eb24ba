//! Correlation keys tying calendar events back to Gradescope assignments.
//!
//! Version 1 encoding: both ids are escaped (`%` as `%25`, `:` as `%3A`) and
//! joined with a single `:`. Plain ids come out unchanged (`"1:A"`), ids that
//! contain the separator can't collide with other pairs. Every event records
//! [`KEY_VERSION`] next to the key so a future encoding can find and migrate
//! events written under this one.

/// Current key encoding version
pub const KEY_VERSION: u32 = 1;

/// Private extended property holding the correlation key
pub const KEY_PROPERTY: &str = "gradesyncKey";

/// Private extended property holding the key encoding version
pub const KEY_VERSION_PROPERTY: &str = "gradesyncKeyVersion";

/// Private extended property holding the due instant as last written
pub const DUE_PROPERTY: &str = "gradesyncDue";

const SEPARATOR: char = ':';

/// Derive the correlation key for an assignment
pub fn external_key(course_id: &str, assignment_id: &str) -> String {
    format!(
        "{}{}{}",
        escape(course_id),
        SEPARATOR,
        escape(assignment_id)
    )
}

/// Split a version 1 key back into `(course_id, assignment_id)`
pub fn parse_external_key(key: &str) -> Option<(String, String)> {
    let (course, assignment) = key.split_once(SEPARATOR)?;
    if assignment.contains(SEPARATOR) {
        return None;
    }
    Some((unescape(course)?, unescape(assignment)?))
}

fn escape(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(part: &str) -> Option<String> {
    let mut out = String::with_capacity(part.len());
    let mut rest = part;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let code = rest.get(idx + 1..idx + 3)?;
        match code {
            "25" => out.push('%'),
            "3A" => out.push(':'),
            _ => return None,
        }
        rest = &rest[idx + 3..];
    }
    out.push_str(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ids() {
        assert_eq!(external_key("1", "A"), "1:A");
        assert_eq!(external_key("823451", "4410982"), "823451:4410982");
    }

    #[test]
    fn test_separator_in_ids_does_not_collide() {
        let a = external_key("1:2", "3");
        let b = external_key("1", "2:3");
        assert_ne!(a, b);
        assert_eq!(a, "1%3A2:3");
        assert_eq!(b, "1:2%3A3");
    }

    #[test]
    fn test_escape_char_in_ids_does_not_collide() {
        // "%3A" taken literally must not look like an escaped separator
        let literal = external_key("1%3A2", "3");
        let escaped = external_key("1:2", "3");
        assert_ne!(literal, escaped);
    }

    #[test]
    fn test_parse_inverts_encoding() {
        for (course, assignment) in [("1", "A"), ("1:2", "3"), ("50%", "a:b:c"), ("", "x")] {
            let key = external_key(course, assignment);
            assert_eq!(
                parse_external_key(&key),
                Some((course.to_string(), assignment.to_string()))
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_external_key("no-separator"), None);
        assert_eq!(parse_external_key("1:2:3"), None);
        assert_eq!(parse_external_key("1%ZZ:2"), None);
        assert_eq!(parse_external_key("1%3:2"), None);
    }
}
