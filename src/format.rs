use chrono::{DateTime, Utc};

/// Human-readable time control: `"180+2"` -> `"3m+2s"`, `"600"` -> `"10m"`.
/// Labels that already contain letters are returned as-is; empty or
/// unparsable input gives `"N/A"`.
pub fn format_time_control(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw == "N/A" {
        return "N/A".to_string();
    }
    if raw.chars().any(|ch| ch.is_ascii_alphabetic()) {
        return raw.to_string();
    }

    if let Some((base, increment)) = raw.split_once('+') {
        let Some(base) = format_seconds(base) else {
            return "N/A".to_string();
        };
        return match format_seconds(increment) {
            Some(increment) => format!("{base}+{increment}"),
            None => base,
        };
    }

    format_seconds(raw).unwrap_or_else(|| "N/A".to_string())
}

fn format_seconds(raw: &str) -> Option<String> {
    let secs = leading_integer(raw)?;
    if secs < 60 {
        return Some(format!("{secs}s"));
    }
    if secs < 3600 {
        let minutes = secs / 60;
        let rest = secs % 60;
        return Some(if rest == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {rest}s")
        });
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let rest = secs % 60;
    Some(match (minutes, rest) {
        (0, 0) => format!("{hours}h"),
        (_, 0) => format!("{hours}h {minutes}m"),
        _ => format!("{hours}h {minutes}m {rest}s"),
    })
}

// Digits up to the first non-digit, so "1/259200" reads as 1.
fn leading_integer(raw: &str) -> Option<u64> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// First `ECO` or `Opening` header value found in a PGN.
pub fn extract_opening(pgn: &str) -> Option<String> {
    pgn.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("[ECO") || line.starts_with("[Opening"))
        .find_map(quoted_value)
}

fn quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    Some(line[start..start + len].to_string())
}

/// `"January 5, 2024"` style date for an epoch-seconds timestamp.
pub fn format_date(epoch_secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0).map(|dt| dt.format("%B %-d, %Y").to_string())
}
