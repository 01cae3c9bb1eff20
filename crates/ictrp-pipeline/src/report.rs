//! Summary of one run, written next to the snapshot as
//! `run_report_<date>.json`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::select::RegistryCount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
  pub this_extract_date:        NaiveDate,
  pub prior_extract_date:       Option<NaiveDate>,
  pub registration_cutoff:      NaiveDate,
  /// `<Trial>` elements in the export.
  pub input_trials:             usize,
  pub duplicates_collapsed:     usize,
  pub pre_cutoff_excluded:      usize,
  pub cancelled_excluded:       usize,
  pub output_trials:            usize,
  pub new_trials:               usize,
  pub registries:               Vec<RegistryCount>,
  pub unmatched_sponsors:       usize,
  pub unassessed_interventions: usize,
  pub refreshed:                Vec<String>,
  pub converged:                bool,
  pub fingerprint:              String,
}

impl RunReport {
  /// Rows removed by every exclusion step combined.
  pub fn excluded(&self) -> usize {
    self.duplicates_collapsed + self.pre_cutoff_excluded + self.cancelled_excluded
  }
}
