// ISO-8601 duration token formatting.

/// Converts a provider duration token such as `PT5H7M` into a human-readable
/// string such as `"5h 7m"`. Empty or unparseable input is returned unchanged
/// so callers can still display whatever the provider sent.
pub fn format_iso_duration(token: &str) -> String {
    match parse_iso_duration(token) {
        Some((hours, minutes)) => format_hours_minutes(hours, minutes),
        None => token.to_string(),
    }
}

/// Renders an hour/minute pair the same way normalized provider durations
/// are rendered. Zero components are omitted.
pub fn format_hours_minutes(hours: u32, minutes: u32) -> String {
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

fn parse_iso_duration(token: &str) -> Option<(u32, u32)> {
    let rest = token.strip_prefix("PT")?;
    if rest.is_empty() {
        return None;
    }

    let mut hours = 0u32;
    let mut minutes = 0u32;
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u32 = digits.parse().ok()?;
        digits.clear();
        match ch {
            'H' => hours = value,
            'M' => minutes = value,
            _ => return None,
        }
    }
    // Trailing digits without a unit marker make the token invalid.
    if !digits.is_empty() {
        return None;
    }
    Some((hours, minutes))
}
