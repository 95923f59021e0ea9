use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Snapshot date for this invocation: an explicit `YYYY-MM-DD`, else the
/// calendar date of `now` in its own timezone.
pub fn resolve_cache_date<Tz: TimeZone>(
    as_of_date_arg: Option<&str>,
    now: DateTime<Tz>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?);
    }
    Ok(now.date_naive())
}

/// Local calendar date, read once per call.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
