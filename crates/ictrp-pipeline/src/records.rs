//! Raw export rows → typed trial records.
//!
//! Dates are parsed per registry, `first_seen` is carried forward from the
//! prior snapshot, and trials not seen before are stamped with this week's
//! extract date.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use ictrp_core::{
  date::{DateField, parse_flexible, parse_trial_date},
  registry::Registry,
  trial::{RawTrial, TrialRecord},
};
use ictrp_tables::FirstSeenTable;

use crate::error::Result;

/// Clean every row. Fails on the first row whose registration date is
/// missing or does not parse, naming the trial.
pub fn clean_all(
  raw: Vec<RawTrial>,
  first_seen: &FirstSeenTable,
  this_extract: NaiveDate,
) -> Result<Vec<TrialRecord>> {
  let mut unknown_prefixes = BTreeSet::new();
  let mut carried = 0usize;

  let records = raw
    .into_iter()
    .map(|r| {
      if Registry::detect(&r.trial_id).is_none() {
        unknown_prefixes.insert(id_prefix(&r.trial_id).to_string());
      }
      let record = clean(r, first_seen, this_extract)?;
      if record.first_seen != this_extract {
        carried += 1;
      }
      Ok(record)
    })
    .collect::<Result<Vec<_>>>()?;

  for prefix in &unknown_prefixes {
    tracing::warn!(
      prefix = %prefix,
      "unrecognised registry prefix; dates parsed with the fallback formats"
    );
  }
  tracing::info!(
    trials = records.len(),
    carried_first_seen = carried,
    new = records.len() - carried,
    "parsed trial dates"
  );
  Ok(records)
}

/// Clean a single row.
pub fn clean(
  raw: RawTrial,
  first_seen: &FirstSeenTable,
  this_extract: NaiveDate,
) -> Result<TrialRecord> {
  let registry = Registry::detect(&raw.trial_id);

  let date_registration = parse_trial_date(
    &raw.trial_id,
    DateField::Registration,
    raw.date_registration.as_deref(),
  )?
  .ok_or_else(|| ictrp_core::Error::MissingDate {
    trial_id: raw.trial_id.clone(),
    field:    DateField::Registration,
  })?;
  let date_enrollment = parse_trial_date(
    &raw.trial_id,
    DateField::Enrollment,
    raw.date_enrollement.as_deref(),
  )?;

  let last_refreshed_on = match raw.last_refreshed_on.as_deref() {
    Some(value) => {
      let parsed = parse_flexible(value);
      if parsed.is_none() {
        tracing::warn!(
          trial_id = %raw.trial_id,
          value,
          "cannot parse Last_Refreshed_on; leaving it blank"
        );
      }
      parsed
    }
    None => None,
  };

  let first_seen = first_seen.get(&raw.trial_id).unwrap_or(this_extract);

  Ok(TrialRecord {
    registry,
    date_registration,
    date_enrollment,
    last_refreshed_on,
    first_seen,
    trial_id: raw.trial_id,
    source_register: raw.source_register,
    primary_sponsor: raw.primary_sponsor,
    normed_sponsor: None,
    recruitment_status: raw.recruitment_status,
    phase: raw.phase,
    study_type: raw.study_type,
    countries: raw.countries,
    public_title: raw.public_title,
    intervention: raw.intervention,
    intervention_type: None,
    web_address: raw.web_address,
    results_url_link: raw.results_url_link,
  })
}

/// Leading letters of a TrialID, used to name unknown registries in logs.
fn id_prefix(trial_id: &str) -> &str {
  let end = trial_id
    .find(|c: char| !c.is_ascii_alphabetic())
    .unwrap_or(trial_id.len());
  &trial_id[..end]
}
