//! Left-joins against the curated tables, and the backlog of rows the tables
//! do not cover yet.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ictrp_core::{lookup::Lookup, trial::TrialRecord};
use ictrp_tables::{InterventionBacklog, SponsorBacklog};

/// Fill `normed_sponsor` from the schedule, keyed on the normalised
/// `primary_sponsor`. Returns the unmatched sponsors with their trial counts,
/// sorted by name.
pub fn merge_sponsors<S: Lookup + ?Sized>(
  records: &mut [TrialRecord],
  schedule: &S,
) -> Vec<SponsorBacklog> {
  let mut unmatched: BTreeMap<String, usize> = BTreeMap::new();

  for record in records.iter_mut() {
    let sponsor = record.primary_sponsor.as_deref().unwrap_or_default();
    match schedule.lookup(sponsor) {
      Some(normed) => record.normed_sponsor = Some(normed.to_string()),
      None => {
        record.normed_sponsor = None;
        *unmatched.entry(sponsor.to_string()).or_default() += 1;
      }
    }
  }

  if unmatched.is_empty() {
    tracing::info!("All sponsor names normalized");
  } else {
    tracing::warn!(
      sponsors = unmatched.len(),
      schedule_entries = schedule.len(),
      "Update the normalisation schedule and rerun"
    );
  }

  unmatched
    .into_iter()
    .map(|(primary_sponsor, trial_count)| SponsorBacklog {
      primary_sponsor,
      trial_count,
    })
    .collect()
}

/// Fill `intervention_type` from the assessments, keyed on TrialID. Returns
/// the unassessed trials in record order.
pub fn merge_intervention_types<I: Lookup + ?Sized>(
  records: &mut [TrialRecord],
  types: &I,
) -> Vec<InterventionBacklog> {
  let mut unassessed = Vec::new();

  for record in records.iter_mut() {
    record.intervention_type = types.lookup(&record.trial_id).map(str::to_string);
    if record.intervention_type.is_none() {
      unassessed.push(InterventionBacklog {
        trial_id:          record.trial_id.clone(),
        public_title:      record.public_title.clone(),
        intervention:      record.intervention.clone(),
        intervention_type: None,
      });
    }
  }

  if unassessed.is_empty() {
    tracing::info!("All intervention types matched");
  } else {
    tracing::warn!(
      trials = unassessed.len(),
      "Update the intervention type assessments and rerun"
    );
  }
  unassessed
}

/// Trials already known before this extract whose registry entry changed
/// since the prior extract, sorted by TrialID.
pub fn refreshed_since(
  records: &[TrialRecord],
  prior_extract: NaiveDate,
  this_extract: NaiveDate,
) -> Vec<String> {
  let mut ids: Vec<String> = records
    .iter()
    .filter(|r| r.first_seen != this_extract)
    .filter(|r| r.last_refreshed_on.is_some_and(|d| d > prior_extract))
    .map(|r| r.trial_id.clone())
    .collect();
  ids.sort();

  if !ids.is_empty() {
    tracing::info!(
      trials = ids.len(),
      %prior_extract,
      "previously seen trials refreshed since the prior extract"
    );
  }
  ids
}
