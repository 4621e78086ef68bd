//! Small string helpers shared by providers and the pipeline

/// Keys at or below this length are fully masked
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Characters shown at each end of a masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Mask an API key for logs: `sk-1...cdef`, or `****` for short keys.
///
/// # Examples
/// ```
/// use campus_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY {
        return "****".to_string();
    }
    let head: String = chars[..KEY_MASK_VISIBLE_CHARS].iter().collect();
    let tail_start = chars.len() - KEY_MASK_VISIBLE_CHARS;
    let tail: String = chars[tail_start..].iter().collect();
    format!("{head}...{tail}")
}

/// Borrow at most `max_chars` characters from the start of `s`.
///
/// # Examples
/// ```
/// use campus_llm::util::truncate_chars;
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("hi", 10), "hi");
/// ```
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key_long() {
        let masked = mask_api_key("sk-1234567890abcdefghij");
        assert_eq!(masked, "sk-1...ghij");
        assert!(!masked.contains("567890"));
    }

    #[test]
    fn test_mask_api_key_short() {
        assert_eq!(mask_api_key(""), "****");
        assert_eq!(mask_api_key("12345678"), "****");
    }

    #[test]
    fn test_truncate_chars_boundaries() {
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }
}
