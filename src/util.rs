use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Creation timestamp for records, local time with microseconds.
pub fn now_timestamp() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Minute-resolution timestamp used by chat messages.
pub fn chat_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Parse the timestamp shapes found in the portal's documents.
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(&ts.replace('Z', "+00:00")) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// "January 05, 2025 at 02:30 PM"; unparseable input comes back unchanged.
pub fn format_timestamp(ts: &str) -> String {
    match parse_timestamp(ts) {
        Some(dt) => dt.format("%B %d, %Y at %I:%M %p").to_string(),
        None => ts.to_string(),
    }
}

pub fn time_ago(ts: &str) -> String {
    time_ago_from(ts, Local::now().naive_local())
}

pub fn time_ago_from(ts: &str, now: NaiveDateTime) -> String {
    let Some(then) = parse_timestamp(ts) else {
        return "Unknown".to_string();
    };
    let diff = now - then;

    if diff.num_days() > 0 {
        format!("{} days ago", diff.num_days())
    } else if diff.num_seconds() > 3600 {
        format!("{} hours ago", diff.num_seconds() / 3600)
    } else if diff.num_seconds() > 60 {
        format!("{} minutes ago", diff.num_seconds() / 60)
    } else {
        "Just now".to_string()
    }
}

pub fn validate_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// Strip script blocks and `javascript:` URLs from user text, then trim.
pub fn sanitize_input(text: &str) -> String {
    let mut cleaned = text.to_string();
    for pattern in [r"(?is)<script.*?</script>", r"(?i)javascript:"] {
        if let Ok(re) = Regex::new(pattern) {
            cleaned = re.replace_all(&cleaned, "").into_owned();
        }
    }
    cleaned.trim().to_string()
}

/// Video room link for a meeting host.
pub fn meeting_link(department: &str, name: &str) -> String {
    let room: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    format!("https://meet.jit.si/{}_{}", department, room)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
