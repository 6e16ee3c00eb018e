//! Absolute time bounds for `--after` / `--before`.
//!
//! Only fully specified points in time are accepted; relative phrases such as
//! "3 days ago" are not parsed. Naive inputs are read in the local timezone.

use anyhow::{Context as _, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse an absolute time bound.
///
/// Accepted forms: RFC 3339 (`2024-03-01T12:00:00Z`), `YYYY-MM-DD HH:MM[:SS]`,
/// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD` (local midnight), `@<unix seconds>`
/// and the keyword `today`.
///
/// # Errors
/// Returns an error if `input` matches none of the accepted forms.
pub fn parse_time(input: &str) -> anyhow::Result<DateTime<Utc>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("today") {
        return start_of_today();
    }
    if let Some(secs) = input.strip_prefix('@') {
        let secs: i64 = secs
            .parse()
            .with_context(|| format!("invalid unix timestamp '{input}'"))?;
        return DateTime::<Utc>::from_timestamp(secs, 0)
            .with_context(|| format!("unix timestamp out of range '{input}'"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return local_to_utc(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return local_to_utc(date.and_time(NaiveTime::MIN));
    }
    bail!("unrecognized time '{input}' (expected e.g. 2024-03-01, 2024-03-01 12:00:00 or @1709290800)")
}

/// Local midnight of the current day.
///
/// # Errors
/// Returns an error if local midnight does not exist (DST gap).
pub fn start_of_today() -> anyhow::Result<DateTime<Utc>> {
    local_to_utc(Local::now().date_naive().and_time(NaiveTime::MIN))
}

fn local_to_utc(naive: NaiveDateTime) -> anyhow::Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("{naive} does not exist in the local timezone"))
}
