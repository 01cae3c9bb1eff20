//! The weekly trial-list transformation.
//!
//! Everything here is pure: the caller reads the export and the curated
//! tables, hands them to [`run`], and writes out what comes back in
//! [`Outcome`]. The steps, in order:
//!
//! 1. [`select::dedupe`] collapses repeated TrialIDs.
//! 2. [`records::clean_all`] parses dates and carries `first_seen` forward.
//! 3. [`filter::apply_filters`] drops old and cancelled trials.
//! 4. [`NormalizationRules`] tidies the free-text columns.
//! 5. [`merge`] joins the sponsor schedule and intervention types.
//! 6. [`trend::weekly_counts`] builds the chart series.
//!
//! [`prepare`] runs steps 1-4; [`prepare_unnormalised`] stops before 4.

pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod merge;
pub mod normalize;
pub mod records;
pub mod report;
pub mod select;
pub mod trend;

use std::collections::HashMap;

use chrono::NaiveDate;
use ictrp_core::{
  lookup::Lookup,
  snapshot::{SnapshotRow, WeeklyCount},
  trial::{RawTrial, TrialField, TrialRecord},
};
use ictrp_tables::{FirstSeenTable, InterventionBacklog, SponsorBacklog};
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use normalize::NormalizationRules;
pub use report::RunReport;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Default for [`RunSettings::registration_cutoff`].
pub fn default_cutoff() -> NaiveDate {
  NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone)]
pub struct RunSettings {
  /// Date of the previous weekly export, if there was one.
  pub prior_extract_date:  Option<NaiveDate>,
  /// Date of the export being processed; new trials are first seen on it.
  pub this_extract_date:   NaiveDate,
  pub registration_cutoff: NaiveDate,
  pub rules:               NormalizationRules,
}

impl RunSettings {
  pub fn new(this_extract_date: NaiveDate) -> Self {
    Self {
      prior_extract_date: None,
      this_extract_date,
      registration_cutoff: default_cutoff(),
      rules: NormalizationRules::default(),
    }
  }
}

// ─── Steps 1-4 ───────────────────────────────────────────────────────────────

/// Records after selection, cleaning and filtering, before any curated table
/// is joined.
#[derive(Debug, Clone)]
pub struct Prepared {
  pub records:    Vec<TrialRecord>,
  pub input:      usize,
  pub duplicates: usize,
  pub filtered:   filter::FilterStats,
  pub registries: Vec<select::RegistryCount>,
}

/// Steps 1-3 only. The free-text columns are as the registries wrote them,
/// which is what field inspection needs to spot spellings without a rule.
pub fn prepare_unnormalised(
  raw: Vec<RawTrial>,
  first_seen: &FirstSeenTable,
  settings: &RunSettings,
) -> Result<Prepared> {
  let input = raw.len();
  let registries = select::registry_counts(&raw);
  let (raw, duplicates) = select::dedupe(raw);

  let records =
    records::clean_all(raw, first_seen, settings.this_extract_date)?;
  let (records, filtered) =
    filter::apply_filters(records, settings.registration_cutoff);

  Ok(Prepared {
    records,
    input,
    duplicates,
    filtered,
    registries,
  })
}

/// Steps 1-4: [`prepare_unnormalised`], then the normalisation rules.
pub fn prepare(
  raw: Vec<RawTrial>,
  first_seen: &FirstSeenTable,
  settings: &RunSettings,
) -> Result<Prepared> {
  let mut prepared = prepare_unnormalised(raw, first_seen, settings)?;
  settings.rules.apply_all(&mut prepared.records);
  Ok(prepared)
}

// ─── Full run ────────────────────────────────────────────────────────────────

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Outcome {
  /// Cleaned records, sorted by TrialID.
  pub records:              Vec<TrialRecord>,
  pub sponsor_backlog:      Vec<SponsorBacklog>,
  pub intervention_backlog: Vec<InterventionBacklog>,
  pub weeks:                Vec<WeeklyCount>,
  pub report:               RunReport,
}

impl Outcome {
  pub fn snapshot_rows(&self) -> Vec<SnapshotRow> {
    self.records.iter().map(SnapshotRow::from).collect()
  }

  /// No sponsor or intervention left for manual curation.
  pub fn converged(&self) -> bool { self.report.converged }
}

pub fn run<S, I>(
  raw: Vec<RawTrial>,
  first_seen: &FirstSeenTable,
  schedule: &S,
  types: &I,
  settings: &RunSettings,
) -> Result<Outcome>
where
  S: Lookup + ?Sized,
  I: Lookup + ?Sized,
{
  let Prepared {
    mut records,
    input,
    duplicates,
    filtered,
    registries,
  } = prepare(raw, first_seen, settings)?;

  let sponsor_backlog = merge::merge_sponsors(&mut records, schedule);
  let intervention_backlog = merge::merge_intervention_types(&mut records, types);
  let refreshed = match settings.prior_extract_date {
    Some(prior) => {
      merge::refreshed_since(&records, prior, settings.this_extract_date)
    }
    None => Vec::new(),
  };

  records.sort_by(|a, b| a.trial_id.cmp(&b.trial_id));
  let weeks = trend::weekly_counts(
    records.iter().map(|r| r.date_registration),
    settings.registration_cutoff,
  );

  let rows: Vec<SnapshotRow> = records.iter().map(SnapshotRow::from).collect();
  let new_trials = records
    .iter()
    .filter(|r| r.first_seen == settings.this_extract_date)
    .count();
  let converged = sponsor_backlog.is_empty() && intervention_backlog.is_empty();

  let report = RunReport {
    this_extract_date: settings.this_extract_date,
    prior_extract_date: settings.prior_extract_date,
    registration_cutoff: settings.registration_cutoff,
    input_trials: input,
    duplicates_collapsed: duplicates,
    pre_cutoff_excluded: filtered.pre_cutoff,
    cancelled_excluded: filtered.cancelled,
    output_trials: records.len(),
    new_trials,
    registries,
    unmatched_sponsors: sponsor_backlog.len(),
    unassessed_interventions: intervention_backlog.len(),
    refreshed,
    converged,
    fingerprint: fingerprint::snapshot_fingerprint(&rows),
  };
  tracing::info!(
    trials = report.output_trials,
    new = report.new_trials,
    converged,
    "run complete"
  );

  Ok(Outcome {
    records,
    sponsor_backlog,
    intervention_backlog,
    weeks,
    report,
  })
}

// ─── Field inspection ────────────────────────────────────────────────────────

/// How often one value of a field occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
  /// `None` for records where the field is empty.
  pub value:  Option<String>,
  pub trials: usize,
}

/// Distinct values of `field` with their counts, most frequent first (ties
/// by value, empty last).
pub fn unique_values(records: &[TrialRecord], field: TrialField) -> Vec<ValueCount> {
  let mut counts: HashMap<Option<String>, usize> = HashMap::new();
  for record in records {
    *counts.entry(record.field_value(field)).or_default() += 1;
  }
  let mut out: Vec<ValueCount> = counts
    .into_iter()
    .map(|(value, trials)| ValueCount { value, trials })
    .collect();
  out.sort_by(|a, b| {
    b.trials
      .cmp(&a.trials)
      .then_with(|| a.value.is_none().cmp(&b.value.is_none()))
      .then_with(|| a.value.cmp(&b.value))
  });
  out
}
