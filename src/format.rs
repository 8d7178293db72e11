//! Display helpers for dates and rich-text post bodies.

use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;

pub const MISSING: &str = "N/A";

/// `05 March 2024`
pub fn date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| MISSING.to_string(), |d| d.format("%d %B %Y").to_string())
}

/// `05 Mar 2024 18:30`
pub fn date_time(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || MISSING.to_string(),
        |d| d.format("%d %b %Y %H:%M").to_string(),
    )
}

/// Relative distance such as "3 hours ago" or "in 2 days".
pub fn to_now(value: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(value) = value else {
        return MISSING.to_string();
    };

    let seconds = (now - value).num_seconds();
    let distance = distance_in_words(seconds.unsigned_abs());
    if seconds >= 0 {
        format!("{} ago", distance)
    } else {
        format!("in {}", distance)
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

fn distance_in_words(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let minutes = (seconds + MINUTE / 2) / MINUTE;
    match seconds {
        s if s < 30 => "less than a minute".to_string(),
        s if s < 45 * MINUTE => plural(minutes.max(1), "minute"),
        s if s < 90 * MINUTE => "about 1 hour".to_string(),
        s if s < DAY => format!("about {}", plural((s + HOUR / 2) / HOUR, "hour")),
        s if s < 42 * HOUR => "1 day".to_string(),
        s if s < MONTH => plural((s + DAY / 2) / DAY, "day"),
        s if s < 45 * DAY => "about 1 month".to_string(),
        s if s < 60 * DAY => "about 2 months".to_string(),
        s if s < YEAR => plural(s / MONTH, "month"),
        s => format!("about {}", plural(s / YEAR, "year")),
    }
}

/// Text content of an HTML fragment, entities decoded and whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortens to at most `max` characters, ending with an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at() -> DateTime<Utc> {
        "2024-03-05T18:30:00Z".parse().unwrap()
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(date(Some(at())), "05 March 2024");
        assert_eq!(date_time(Some(at())), "05 Mar 2024 18:30");
        assert_eq!(date(None), "N/A");
        assert_eq!(date_time(None), "N/A");
    }

    #[test]
    fn test_to_now() {
        let now = at();
        assert_eq!(to_now(Some(now - Duration::seconds(10)), now), "less than a minute ago");
        assert_eq!(to_now(Some(now - Duration::minutes(5)), now), "5 minutes ago");
        assert_eq!(to_now(Some(now - Duration::hours(3)), now), "about 3 hours ago");
        assert_eq!(to_now(Some(now + Duration::days(2)), now), "in 2 days");
        assert_eq!(to_now(Some(now - Duration::days(400)), now), "about 1 year ago");
        assert_eq!(to_now(None, now), "N/A");
    }

    #[test]
    fn test_plain_text_strips_markup() {
        assert_eq!(
            plain_text("<p>Fish &amp; chips</p><p>Open&nbsp;late</p>"),
            "Fish & chips Open late"
        );
        assert_eq!(plain_text("no markup"), "no markup");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("a longer sentence", 8), "a longe…");
    }
}
