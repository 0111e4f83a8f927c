use chrono::Duration;

/// Escape user-controlled text for HTML parse mode.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a wait as `13d 23:59:59` (or `04:09:59` under a day).
pub fn format_wait(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_entities() {
        assert_eq!(escape_html("a<b> & c"), "a&lt;b&gt; &amp; c");
    }

    #[test]
    fn formats_waits() {
        assert_eq!(
            format_wait(Duration::days(14) - Duration::seconds(1)),
            "13d 23:59:59"
        );
        assert_eq!(format_wait(Duration::seconds(75)), "00:01:15");
        assert_eq!(format_wait(Duration::seconds(-5)), "00:00:00");
        assert_eq!(
            format_wait(Duration::hours(4) + Duration::minutes(10)),
            "04:10:00"
        );
    }
}
