use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Parse a user-entered date or timestamp.
///
/// Accepts RFC 3339 (`2025-03-01T09:30:00Z`, `...+02:00`), a naive
/// date-time (`2025-03-01T09:30:00` or with a space, treated as UTC), or a
/// bare date (`2025-03-01`, midnight UTC). Anything else is `None`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// 00:00:00.000 on the day of `ts`
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 on the day of `ts`
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    ts.date_naive().and_time(last).and_utc()
}

/// Milliseconds since the epoch, 0 for unparseable input
pub fn timestamp_millis_or_zero(s: &str) -> i64 {
    parse_timestamp(s).map(|t| t.timestamp_millis()).unwrap_or(0)
}

/// Canonical stamp format: `2025-03-01T09:30:00.000Z`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds as `HH:MM:SS` (hours do not wrap)
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
