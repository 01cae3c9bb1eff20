//! The `first_seen` tracking table carried forward from last week.
//!
//! Any earlier snapshot works as input: only `trialid` and `first_seen` are
//! read, every other column is ignored.

use std::{collections::HashMap, fs::File, io, path::Path};

use chrono::NaiveDate;
use ictrp_core::date::parse_flexible;
use serde::Deserialize;

use crate::error::{Error, Result};

const TABLE: &str = "first_seen";

#[derive(Deserialize)]
struct Row {
  #[serde(alias = "TrialID", alias = "trial_id")]
  trialid:    String,
  #[serde(default)]
  first_seen: Option<String>,
}

/// TrialID → date the trial first appeared in a weekly export.
#[derive(Debug, Clone, Default)]
pub struct FirstSeenTable {
  dates: HashMap<String, NaiveDate>,
}

impl FirstSeenTable {
  /// No prior snapshot: every trial is new this week.
  pub fn empty() -> Self { Self::default() }

  pub fn from_path(path: &Path) -> Result<Self> {
    let file = File::open(path).map_err(|source| Error::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_reader(file)
  }

  /// Rows with a blank `first_seen` are skipped. When a TrialID appears more
  /// than once the earliest date wins.
  pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
    let mut rdr = csv::ReaderBuilder::new()
      .trim(csv::Trim::All)
      .from_reader(reader);

    let mut dates: HashMap<String, NaiveDate> = HashMap::new();
    for row in rdr.deserialize::<Row>() {
      let row = row?;
      let Some(raw) = row.first_seen.filter(|s| !s.is_empty()) else {
        continue;
      };
      let date = parse_flexible(&raw).ok_or_else(|| Error::DateParse {
        table: TABLE,
        key:   row.trialid.clone(),
        value: raw.clone(),
      })?;
      dates
        .entry(row.trialid)
        .and_modify(|d| *d = (*d).min(date))
        .or_insert(date);
    }

    tracing::debug!(entries = dates.len(), "loaded first_seen table");
    Ok(Self { dates })
  }

  pub fn get(&self, trial_id: &str) -> Option<NaiveDate> {
    self.dates.get(trial_id).copied()
  }

  pub fn len(&self) -> usize { self.dates.len() }

  pub fn is_empty(&self) -> bool { self.dates.is_empty() }
}
