//! Reset-boundary computation for notices. Kept as a pure function so the
//! timezone edge cases are testable without a database or a clock.

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// The instant of the next local midnight after `now` in `tz`: the start of
/// the calendar day following the creation day, recipient-local.
///
/// DST edges: a midnight erased by a spring-forward gap resolves to the
/// first instant that exists on that day; an ambiguous midnight (clocks set
/// back across it) takes the earlier occurrence.
pub fn next_local_midnight(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(&tz).date_naive();
    let next_day = local_date + Days::new(1);
    let midnight = NaiveDateTime::new(next_day, NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.to_utc(),
        LocalResult::Ambiguous(earliest, _) => earliest.to_utc(),
        LocalResult::None => {
            let mut candidate = midnight + Duration::minutes(1);
            let end = midnight + Duration::hours(3);
            while candidate <= end {
                if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
                    return dt.to_utc();
                }
                candidate += Duration::minutes(1);
            }
            // No real zone skips more than a few hours past midnight.
            now + Duration::days(1)
        }
    }
}
