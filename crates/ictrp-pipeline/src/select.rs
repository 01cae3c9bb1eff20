//! First pass over the export: collapse repeated TrialIDs and count rows per
//! source registry.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use ictrp_core::{date::parse_flexible, trial::RawTrial};
use serde::{Deserialize, Serialize};

/// Keep one row per TrialID, in first-appearance order.
///
/// When an ID repeats, the row with the latest `Last_Refreshed_on` wins; an
/// unparseable or missing refresh date counts as oldest, and ties keep the
/// earlier row. Returns the kept rows and how many were dropped.
pub fn dedupe(raw: Vec<RawTrial>) -> (Vec<RawTrial>, usize) {
  let total = raw.len();
  let mut index: HashMap<String, usize> = HashMap::with_capacity(total);
  let mut kept: Vec<RawTrial> = Vec::with_capacity(total);

  for trial in raw {
    match index.get(&trial.trial_id) {
      Some(&i) => {
        if refreshed(&trial) > refreshed(&kept[i]) {
          kept[i] = trial;
        }
      }
      None => {
        index.insert(trial.trial_id.clone(), kept.len());
        kept.push(trial);
      }
    }
  }

  let dropped = total - kept.len();
  if dropped > 0 {
    tracing::warn!(dropped, "collapsed repeated TrialIDs in export");
  }
  (kept, dropped)
}

fn refreshed(trial: &RawTrial) -> Option<NaiveDate> {
  trial.last_refreshed_on.as_deref().and_then(parse_flexible)
}

/// Number of export rows from one `Source_Register` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCount {
  pub source_register: String,
  pub trials:          usize,
}

/// Rows per `Source_Register`, most frequent first (ties by name). Rows with
/// no register are not counted.
pub fn registry_counts(raw: &[RawTrial]) -> Vec<RegistryCount> {
  let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
  for trial in raw {
    if let Some(source) = trial.source_register.as_deref() {
      *counts.entry(source).or_default() += 1;
    }
  }
  let mut out: Vec<RegistryCount> = counts
    .into_iter()
    .map(|(source, trials)| RegistryCount {
      source_register: source.to_string(),
      trials,
    })
    .collect();
  out.sort_by(|a, b| b.trials.cmp(&a.trials));
  out
}
