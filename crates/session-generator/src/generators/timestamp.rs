//! Timestamp value generators.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Generate a timestamp inside the trailing `days` window ending at `now`.
///
/// Day, hour and minute offsets are drawn independently and subtracted from
/// `now`, so the result lies in `(now - days, now]`. A zero window yields `now`.
pub fn generate_trailing_timestamp<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    days: u32,
) -> DateTime<Utc> {
    if days == 0 {
        return now;
    }

    let day_offset = rng.gen_range(0..i64::from(days));
    let hour_offset = rng.gen_range(0..24);
    let minute_offset = rng.gen_range(0..60);

    now - Duration::days(day_offset) - Duration::hours(hour_offset) - Duration::minutes(minute_offset)
}
