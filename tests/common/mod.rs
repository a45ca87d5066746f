//! Shared fixtures for integration tests.

#![allow(dead_code)]

use actiwin::{Group, Observation};
use chrono::{Duration, NaiveDate};

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date")
}

/// One subject whose day `i` (from `start`) holds `minutes_per_day[i]`
/// consecutive minute readings starting at midnight. Activity cycles 0..=500.
pub fn subject(
    participant_id: &str,
    group: Group,
    start: &str,
    minutes_per_day: &[u32],
) -> Vec<Observation> {
    let start = day(start);
    let mut out = Vec::new();
    for (i, &minutes) in minutes_per_day.iter().enumerate() {
        let midnight = (start + Duration::days(i as i64))
            .and_hms_opt(0, 0, 0)
            .expect("midnight");
        for m in 0..minutes {
            out.push(Observation::new(
                participant_id,
                group,
                midnight + Duration::minutes(i64::from(m)),
                Some(f64::from((i as u32 * 1440 + m) % 501)),
            ));
        }
    }
    out
}
