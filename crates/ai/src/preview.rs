/// Default number of characters of a prompt or response shown in logs
pub const DEFAULT_MAX_LOG_LENGTH: usize = 200;

/// Trim `s` and cut it to `limit` characters, appending `...` when cut.
///
/// A zero limit yields an empty string.
pub fn truncate_for_log(s: &str, limit: usize) -> String {
    let s = s.trim();
    if limit == 0 {
        return String::new();
    }

    match s.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(truncate_for_log("  hello \n", 10), "hello");
        assert_eq!(truncate_for_log("exactly", 7), "exactly");
    }

    #[test]
    fn test_long_text_is_cut_on_char_boundary() {
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
        assert_eq!(truncate_for_log("привет мир", 6), "привет...");
    }

    #[test]
    fn test_zero_limit() {
        assert_eq!(truncate_for_log("anything", 0), "");
    }
}
