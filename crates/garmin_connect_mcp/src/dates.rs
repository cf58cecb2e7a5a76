//! Argument defaulting for the date-bearing operations.

use chrono::{Duration, NaiveDate};
use garmin_connect_client::dates::parse_calendar_date;

use crate::error::{OperationError, OperationResult};

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;
pub const ACTIVITY_LOOKBACK_DAYS: i64 = 30;

/// Parse a caller supplied date; blank input counts as absent.
fn parse_optional(arg: Option<&str>, name: &str) -> OperationResult<Option<NaiveDate>> {
    match arg.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_calendar_date(s).map(Some).ok_or_else(|| {
            OperationError::InvalidArgument(format!(
                "{name} must be an ISO 8601 date (YYYY-MM-DD), got {s:?}"
            ))
        }),
    }
}

/// The supplied day, or yesterday.
pub fn resolve_day(arg: Option<&str>, today: NaiveDate) -> OperationResult<NaiveDate> {
    Ok(parse_optional(arg, "date")?.unwrap_or(today - Duration::days(1)))
}

/// The supplied start day, or the start of the activity lookback window.
pub fn resolve_activities_start(
    arg: Option<&str>,
    today: NaiveDate,
) -> OperationResult<NaiveDate> {
    Ok(parse_optional(arg, "start")?
        .unwrap_or(today - Duration::days(ACTIVITY_LOOKBACK_DAYS)))
}

pub fn resolve_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT)
}
