//! The weekly snapshot row: the fixed 15-column schema of
//! `trial_list_<date>.csv`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::trial::TrialRecord;

/// Column order of the snapshot file. Serde writes struct fields in
/// declaration order, so this must list them identically.
pub const SNAPSHOT_COLUMNS: [&str; 15] = [
  "trialid",
  "source_register",
  "date_registration",
  "date_enrollement",
  "normed_spon_names",
  "recruitment_status",
  "phase",
  "study_type",
  "countries",
  "public_title",
  "intervention_type",
  "web_address",
  "results_url_link",
  "last_refreshed_on",
  "first_seen",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
  pub trialid:            String,
  pub source_register:    Option<String>,
  pub date_registration:  NaiveDate,
  pub date_enrollement:   Option<NaiveDate>,
  pub normed_spon_names:  Option<String>,
  pub recruitment_status: Option<String>,
  pub phase:              Option<String>,
  pub study_type:         Option<String>,
  pub countries:          Option<String>,
  pub public_title:       Option<String>,
  pub intervention_type:  Option<String>,
  pub web_address:        Option<String>,
  pub results_url_link:   Option<String>,
  pub last_refreshed_on:  Option<NaiveDate>,
  pub first_seen:         Option<NaiveDate>,
}

impl From<&TrialRecord> for SnapshotRow {
  fn from(t: &TrialRecord) -> Self {
    Self {
      trialid:            t.trial_id.clone(),
      source_register:    t.source_register.clone(),
      date_registration:  t.date_registration,
      date_enrollement:   t.date_enrollment,
      normed_spon_names:  t.normed_sponsor.clone(),
      recruitment_status: t.recruitment_status.clone(),
      phase:              t.phase.clone(),
      study_type:         t.study_type.clone(),
      countries:          t.countries.clone(),
      public_title:       t.public_title.clone(),
      intervention_type:  t.intervention_type.clone(),
      web_address:        t.web_address.clone(),
      results_url_link:   t.results_url_link.clone(),
      last_refreshed_on:  t.last_refreshed_on,
      first_seen:         Some(t.first_seen),
    }
  }
}

/// One row of `trial_count_<date>.csv`: registrations in the week ending on
/// `week_ending` (a Sunday) and the running total up to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyCount {
  pub week_ending:       NaiveDate,
  pub new_trials:        u32,
  pub cumulative_trials: u32,
}
