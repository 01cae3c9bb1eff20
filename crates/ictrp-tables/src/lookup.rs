//! The two manually curated lookup tables.
//!
//! Both are two-column CSVs maintained by hand between runs. A row whose value
//! is blank is treated as "not yet curated" and left out of the table.

use std::{collections::HashMap, fs::File, io, path::Path};

use ictrp_core::lookup::Lookup;

use crate::error::{Error, Result};

/// Raw sponsor name → normalised sponsor name
/// (`norm_schedule_<date>.csv`).
#[derive(Debug, Clone, Default)]
pub struct SponsorSchedule {
  entries: HashMap<String, String>,
}

impl SponsorSchedule {
  pub const TABLE: &'static str = "sponsor schedule";
  pub const KEY_COLUMN: &'static str = "unique_spon_names";
  pub const VALUE_COLUMN: &'static str = "normed_spon_names";

  pub fn from_path(path: &Path) -> Result<Self> {
    Self::from_reader(open(path)?)
  }

  pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
    let entries =
      read_pairs(reader, Self::TABLE, Self::KEY_COLUMN, Self::VALUE_COLUMN)?;
    Ok(Self { entries })
  }
}

impl Lookup for SponsorSchedule {
  fn lookup(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }

  fn len(&self) -> usize { self.entries.len() }
}

/// TrialID → manually assessed intervention type
/// (`int_type_data_<date>.csv`).
#[derive(Debug, Clone, Default)]
pub struct InterventionTypes {
  entries: HashMap<String, String>,
}

impl InterventionTypes {
  pub const TABLE: &'static str = "intervention types";
  pub const KEY_COLUMN: &'static str = "trial_id";
  pub const VALUE_COLUMN: &'static str = "intervention_type";

  pub fn from_path(path: &Path) -> Result<Self> {
    Self::from_reader(open(path)?)
  }

  pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
    let entries =
      read_pairs(reader, Self::TABLE, Self::KEY_COLUMN, Self::VALUE_COLUMN)?;
    Ok(Self { entries })
  }
}

impl Lookup for InterventionTypes {
  fn lookup(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }

  fn len(&self) -> usize { self.entries.len() }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<File> {
  File::open(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Read a key/value pair out of two named columns. Other columns (including
/// the unnamed index column spreadsheets and dataframes like to add) are
/// ignored.
fn read_pairs<R: io::Read>(
  reader: R,
  table: &'static str,
  key_column: &'static str,
  value_column: &'static str,
) -> Result<HashMap<String, String>> {
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .flexible(true)
    .from_reader(reader);

  let headers = rdr.headers()?.clone();
  let column = |name: &'static str| {
    headers
      .iter()
      .position(|h| h == name)
      .ok_or(Error::MissingColumn {
        table,
        column: name,
      })
  };
  let key_idx = column(key_column)?;
  let value_idx = column(value_column)?;

  let mut entries: HashMap<String, String> = HashMap::new();
  let mut skipped = 0usize;
  for record in rdr.records() {
    let record = record?;
    let key = record.get(key_idx).unwrap_or_default();
    let value = record.get(value_idx).unwrap_or_default();
    if key.is_empty() || value.is_empty() {
      skipped += 1;
      continue;
    }
    match entries.get(key) {
      Some(existing) if existing != value => {
        return Err(Error::ConflictingEntry {
          table,
          key: key.to_string(),
          first: existing.clone(),
          second: value.to_string(),
        });
      }
      Some(_) => {}
      None => {
        entries.insert(key.to_string(), value.to_string());
      }
    }
  }

  tracing::debug!(table, entries = entries.len(), skipped, "loaded lookup table");
  Ok(entries)
}
