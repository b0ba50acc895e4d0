//! Rolling weekly break summary.

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::storage::LogEntry;

/// Breaks taken on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub breaks: u32,
}

/// Break counts for the seven calendar days ending with `now`'s day,
/// oldest first. Days are taken in `now`'s timezone.
pub fn weekly_buckets<Tz: TimeZone>(entries: &[LogEntry], now: &DateTime<Tz>) -> Vec<DayBucket> {
    let tz = now.timezone();
    let mut by_day: HashMap<NaiveDate, u32> = HashMap::new();
    for entry in entries {
        if let Some(at) = tz.timestamp_millis_opt(entry.t).single() {
            *by_day.entry(at.date_naive()).or_default() += 1;
        }
    }

    let today = now.date_naive();
    (0..7u64)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|day| DayBucket {
            day,
            breaks: by_day.get(&day).copied().unwrap_or(0),
        })
        .collect()
}
