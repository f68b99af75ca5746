use chrono::{Local, LocalResult, TimeZone};

pub fn timestamp_to_string(tm: i64) -> String {
    match Local.timestamp_opt(tm, 0) {
        LocalResult::None => "".to_string(),
        LocalResult::Single(v) => v.to_string(),
        LocalResult::Ambiguous(v1, v2) => format!("{}, {}", v1, v2),
    }
}

/// Cut `msg` to `len` characters, titles and lyrics are often not ascii
pub fn short_msg(msg: &str, len: usize) -> String {
    match msg.char_indices().nth(len) {
        Some((idx, _)) => format!("{}...", &msg[..idx]),
        None => msg.to_string(),
    }
}

pub fn opt_to_string(val: &Option<String>) -> String {
    val.clone().unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_msg_on_char_boundary() {
        assert_eq!(short_msg("hello", 10), "hello");
        assert_eq!(short_msg("hello", 5), "hello");
        assert_eq!(short_msg("hello world", 5), "hello...");
        assert_eq!(short_msg("夜空中最亮的星", 3), "夜空中...");
    }

    #[test]
    fn empty_option_as_dash() {
        assert_eq!(opt_to_string(&None), "-");
        assert_eq!(opt_to_string(&Some("abc".to_string())), "abc");
    }
}
