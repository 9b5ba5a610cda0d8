//! Misc

pub mod events;
pub mod paginate;

use std::time::Duration;

/// Discord timestamp markup, rendered in the reader's timezone.
/// `style` is one of Discord's format letters, e.g. `F` or `R`.
pub fn timestamp(unix: i64, style: char) -> String {
    format!("<t:{unix}:{style}>")
}

/// Writes an integer with `,` between thousands.
pub fn separated(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats seconds as `1d 2h 3m 4s`.
pub fn format_playtime(total_secs: u64) -> String {
    let days = total_secs / 86400;
    let hours = total_secs % 86400 / 3600;
    let mins = total_secs % 3600 / 60;
    let secs = total_secs % 60;

    format!("{days}d {hours}h {mins}m {secs}s")
}

/// Formats a duration as `26h 3m 4s`.
pub fn format_uptime(dur: &Duration) -> String {
    let total_secs = dur.as_secs();

    let hours = total_secs / 3600;
    let mins = total_secs % 3600 / 60;
    let secs = total_secs % 60;

    format!("{hours}h {mins}m {secs}s")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(separated(0), "0");
        assert_eq!(separated(999), "999");
        assert_eq!(separated(1000), "1,000");
        assert_eq!(separated(1234567), "1,234,567");
        assert_eq!(separated(-45000), "-45,000");
    }

    #[test]
    fn playtime_keeps_days() {
        assert_eq!(format_playtime(0), "0d 0h 0m 0s");
        assert_eq!(format_playtime(90061), "1d 1h 1m 1s");
    }

    #[test]
    fn uptime_counts_hours_past_a_day() {
        assert_eq!(format_uptime(&Duration::from_secs(93784)), "26h 3m 4s");
    }

    #[test]
    fn discord_timestamps() {
        assert_eq!(timestamp(1700000000, 'R'), "<t:1700000000:R>");
    }
}
