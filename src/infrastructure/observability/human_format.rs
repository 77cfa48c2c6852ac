const SCALED_UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Renders a byte count with the largest unit keeping the printed value under 1024.
pub fn format_bytes(size: u64) -> String {
    if size < 1024 {
        return format!("{}B", size);
    }

    let mut readable = size as f64 / 1024.0;
    for unit in SCALED_UNITS {
        // 1023.95 and up would print as 1024.0; carry into the next unit
        if (readable * 10.0).round() < 10240.0 {
            return format!("{:.1}{}", readable, unit);
        }
        readable /= 1024.0;
    }
    format!("{:.1}PB", readable)
}

/// Renders a duration as `1h01m01s`, `1m05s` or `7s`, rounded to whole seconds.
pub fn format_seconds(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return "0s".to_string();
    }

    let total = seconds.round_ties_even() as u64;
    let (minutes, secs) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{}h{:02}m{:02}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
