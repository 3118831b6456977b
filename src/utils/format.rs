use std::cmp::Ordering;

/// Format a study date for table display.
/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS`; falls back to the date part.
pub fn format_study_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

/// Case-insensitive ordering for table sorting
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Case-insensitive substring match for list filtering
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_study_date() {
        assert_eq!(
            format_study_date("2024-05-01T09:30:00Z"),
            "2024-05-01 09:30"
        );
        assert_eq!(
            format_study_date("2024-05-01 09:30:00"),
            "2024-05-01 09:30"
        );
        assert_eq!(format_study_date("2024-05-01"), "2024-05-01");
        assert_eq!(format_study_date("bogus"), "bogus");
    }

    #[test]
    fn test_case_insensitive_helpers() {
        assert_eq!(cmp_ignore_case("Alice", "alice"), Ordering::Equal);
        assert_eq!(cmp_ignore_case("alice", "Bob"), Ordering::Less);
        assert!(contains_ignore_case("Radiology", "RAD"));
        assert!(!contains_ignore_case("Radiology", "xyz"));
    }
}
