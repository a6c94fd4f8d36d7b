//! Recurrence arithmetic over `starts_on + k * frequency_days`
//!
//! Calendar projection and live dispatch both go through the same index arithmetic,
//! so a previewed occurrence is exactly the instant the dispatcher will fire on.

use chrono::{DateTime, Duration, Utc};

use crate::domain::Schedule;

const MILLIS_PER_DAY: i64 = 86_400_000;

fn period_millis(schedule: &Schedule) -> Option<i64> {
    if schedule.frequency_days == 0 {
        return None;
    }
    i64::from(schedule.frequency_days).checked_mul(MILLIS_PER_DAY)
}

fn occurrence(schedule: &Schedule, index: i64) -> Option<DateTime<Utc>> {
    let offset = index.checked_mul(period_millis(schedule)?)?;
    schedule
        .starts_on
        .checked_add_signed(Duration::milliseconds(offset))
}

/// Smallest `k` with `starts_on + k * period >= at`
fn first_index_at_or_after(schedule: &Schedule, at: DateTime<Utc>) -> Option<i64> {
    let period = period_millis(schedule)?;
    if at <= schedule.starts_on {
        return Some(0);
    }
    let elapsed = (at - schedule.starts_on).num_milliseconds();
    let index = elapsed / period;
    // Truncation to milliseconds can leave the candidate just short of `at`
    if occurrence(schedule, index)? < at {
        Some(index + 1)
    } else {
        Some(index)
    }
}

fn within_end(schedule: &Schedule, at: DateTime<Utc>) -> bool {
    !matches!(schedule.ends_on, Some(end) if at > end)
}

/// Ordered occurrences inside `[from, to]`, both bounds inclusive
///
/// Nothing is produced for a disabled schedule, a zero frequency, an empty
/// window, or a series whose `ends_on` precedes the window.
pub fn occurrences_between(
    schedule: &Schedule,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    if schedule.disabled || to < from {
        return Vec::new();
    }
    let upper = match schedule.ends_on {
        Some(end) if end < to => end,
        _ => to,
    };
    let Some(mut index) = first_index_at_or_after(schedule, from) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    while let Some(at) = occurrence(schedule, index) {
        if at > upper {
            break;
        }
        out.push(at);
        index += 1;
    }
    out
}

/// First occurrence at or after `at`, if the series still has one
pub fn next_on_or_after(schedule: &Schedule, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if schedule.disabled {
        return None;
    }
    let index = first_index_at_or_after(schedule, at)?;
    occurrence(schedule, index).filter(|next| within_end(schedule, *next))
}

/// First occurrence strictly after `at`
pub fn next_after(schedule: &Schedule, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if schedule.disabled {
        return None;
    }
    let mut index = first_index_at_or_after(schedule, at)?;
    if occurrence(schedule, index)? == at {
        index += 1;
    }
    occurrence(schedule, index).filter(|next| within_end(schedule, *next))
}
