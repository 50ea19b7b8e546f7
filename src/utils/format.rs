//! Text formatting utilities

/// Truncate a string to at most `max_len` characters, ending in `...` when cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len >= 3 {
        let trimmed = s.chars().take(max_len - 3).collect::<String>();
        format!("{trimmed}...")
    } else {
        ".".repeat(max_len)
    }
}

/// Keep the first `max_words` whitespace-separated words of `text`.
///
/// Text already within the limit is returned unchanged so that its content
/// hash matches what was embedded on earlier runs.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    if words.clone().count() <= max_words {
        return text.to_string();
    }
    words.by_ref().take(max_words).collect::<Vec<_>>().join(" ")
}

/// Render a duration in days as a short human string ("today", "3d ago").
pub fn format_age_days(days: i64) -> String {
    match days {
        i64::MIN..=0 => "today".to_string(),
        1..=59 => format!("{days}d ago"),
        _ => format!("{}mo ago", days / 30),
    }
}
