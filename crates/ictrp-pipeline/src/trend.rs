//! Weekly registration counts for the trend chart.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use ictrp_core::snapshot::WeeklyCount;

/// The Sunday closing the week that contains `date`. A Sunday is its own
/// week end.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
  let to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
  date + Days::new(u64::from(to_sunday))
}

/// Bucket registration dates on or after `cutoff` into Sunday-ending weeks.
///
/// Weeks between the first and last non-empty week are present with a zero
/// count; the cumulative column is the running total.
pub fn weekly_counts(
  registrations: impl IntoIterator<Item = NaiveDate>,
  cutoff: NaiveDate,
) -> Vec<WeeklyCount> {
  let mut buckets: BTreeMap<NaiveDate, u32> = BTreeMap::new();
  for date in registrations.into_iter().filter(|d| *d >= cutoff) {
    *buckets.entry(week_ending(date)).or_default() += 1;
  }

  let (Some(&first), Some(&last)) =
    (buckets.keys().next(), buckets.keys().next_back())
  else {
    return Vec::new();
  };

  let mut weeks = Vec::new();
  let mut cumulative = 0u32;
  let mut week = first;
  while week <= last {
    let new_trials = buckets.get(&week).copied().unwrap_or(0);
    cumulative += new_trials;
    weeks.push(WeeklyCount {
      week_ending: week,
      new_trials,
      cumulative_trials: cumulative,
    });
    week = week + Days::new(7);
  }
  weeks
}
