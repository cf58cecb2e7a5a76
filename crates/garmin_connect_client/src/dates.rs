//! Calendar date parsing shared by the client and its callers.

use chrono::NaiveDate;

/// Parse an ISO 8601 calendar date.
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (date part is kept, offset ignored)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS (date part is kept)
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.date());
    }
    None
}
