//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Build a filesystem-safe stem from free text.
///
/// Keeps alphanumerics, `_` and `-` (which also drops path separators and
/// other characters rejected by common filesystems), then cuts the result to
/// `max_chars` characters. Falls back to `"line"` when nothing usable remains.
pub fn sanitize_for_filename(s: &str, max_chars: usize) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .take(max_chars)
        .collect();
    if kept.is_empty() {
        "line".to_string()
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("日本語テスト", 30), "日本語テスト");
        assert_eq!(truncate("日本語テスト文字列", 15), "日本語テ...");
    }

    #[test]
    fn test_sanitize_for_filename() {
        assert_eq!(sanitize_for_filename("Hello, world!", 40), "Helloworld");
        assert_eq!(sanitize_for_filename("  ...  ", 40), "line");
        assert_eq!(sanitize_for_filename("abcdef", 3), "abc");
        assert_eq!(sanitize_for_filename("a/b\\c", 40), "abc");
        assert_eq!(sanitize_for_filename("你好，世界", 40), "你好世界");
    }

    #[test]
    fn test_truncate_emoji() {
        // 4 bytes per emoji: max_len=10 -> target=7 -> boundary 4
        assert_eq!(truncate("👋🌍🎉", 10), "👋...");
    }
}
