//! Exclusion rules: registrations before the cutoff, then cancelled or
//! withdrawn trials.

use chrono::NaiveDate;
use ictrp_core::trial::TrialRecord;
use serde::{Deserialize, Serialize};

/// Counts from one pass of [`apply_filters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
  pub pre_cutoff: usize,
  pub cancelled:  usize,
  pub remaining:  usize,
}

/// Drop trials registered before `cutoff`, then trials that are cancelled or
/// withdrawn. Order is preserved.
pub fn apply_filters(
  records: Vec<TrialRecord>,
  cutoff: NaiveDate,
) -> (Vec<TrialRecord>, FilterStats) {
  let before = records.len();
  let recent: Vec<TrialRecord> = records
    .into_iter()
    .filter(|r| r.date_registration >= cutoff)
    .collect();
  let pre_cutoff = before - recent.len();
  tracing::info!(
    excluded = pre_cutoff,
    remaining = recent.len(),
    %cutoff,
    "excluded trials registered before cutoff"
  );

  let before = recent.len();
  let active: Vec<TrialRecord> =
    recent.into_iter().filter(|r| !r.is_cancelled()).collect();
  let cancelled = before - active.len();
  tracing::info!(
    excluded = cancelled,
    remaining = active.len(),
    "excluded cancelled or withdrawn trials"
  );

  let stats = FilterStats {
    pre_cutoff,
    cancelled,
    remaining: active.len(),
  };
  (active, stats)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn record(id: &str, registered: NaiveDate) -> TrialRecord {
    TrialRecord {
      trial_id:           id.into(),
      registry:           None,
      source_register:    None,
      date_registration:  registered,
      date_enrollment:    None,
      primary_sponsor:    None,
      normed_sponsor:     None,
      recruitment_status: None,
      phase:              None,
      study_type:         None,
      countries:          None,
      public_title:       None,
      intervention:       None,
      intervention_type:  None,
      web_address:        None,
      results_url_link:   None,
      last_refreshed_on:  None,
      first_seen:         ymd(2020, 3, 18),
    }
  }

  #[test]
  fn cutoff_is_inclusive() {
    let cutoff = ymd(2020, 1, 1);
    let (kept, stats) = apply_filters(
      vec![
        record("NCT1", ymd(2019, 12, 31)),
        record("NCT2", ymd(2020, 1, 1)),
        record("NCT3", ymd(2020, 2, 1)),
      ],
      cutoff,
    );
    assert_eq!(stats.pre_cutoff, 1);
    assert_eq!(stats.remaining, 2);
    assert_eq!(kept[0].trial_id, "NCT2");
  }

  #[test]
  fn cancelled_and_withdrawn_are_dropped() {
    let date = ymd(2020, 2, 1);
    let mut cancelled = record("ChiCTR1", date);
    cancelled.public_title =
      Some("Cancelled by the investigator Chloroquine trial".into());
    let mut withdrawn = record("NCT2", date);
    withdrawn.recruitment_status = Some("Withdrawn".into());
    let mut lowercase = record("NCT3", date);
    lowercase.public_title = Some("cancelled elective surgery".into());

    let (kept, stats) = apply_filters(
      vec![cancelled, withdrawn, lowercase, record("NCT4", date)],
      ymd(2020, 1, 1),
    );
    assert_eq!(stats.cancelled, 2);
    assert_eq!(stats.remaining, 2);
    let ids: Vec<_> = kept.iter().map(|r| r.trial_id.as_str()).collect();
    assert_eq!(ids, ["NCT3", "NCT4"]);
  }

  #[test]
  fn pre_cutoff_cancelled_counts_once() {
    let mut old = record("NCT1", ymd(2019, 5, 1));
    old.recruitment_status = Some("Withdrawn".into());
    let (_, stats) = apply_filters(vec![old], ymd(2020, 1, 1));
    assert_eq!(stats, FilterStats {
      pre_cutoff: 1,
      cancelled:  0,
      remaining:  0,
    });
  }
}
