//! Backlogs written for manual curation: `to_norm.csv` and
//! `int_to_assess.csv`.
//!
//! Column headers match what the analyst copies back into the curated tables,
//! so they keep the export's spelling.

use std::io;

use serde::Serialize;

use crate::error::Result;

/// A sponsor name missing from the schedule, with how many trials use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorBacklog {
  #[serde(rename = "Primary_sponsor")]
  pub primary_sponsor: String,
  /// Count of trials; the header is `TrialID` because it is a count over that
  /// column.
  #[serde(rename = "TrialID")]
  pub trial_count:     usize,
}

/// A trial with no intervention-type assessment yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterventionBacklog {
  #[serde(rename = "TrialID")]
  pub trial_id:          String,
  #[serde(rename = "Public_title")]
  pub public_title:      Option<String>,
  #[serde(rename = "Intervention")]
  pub intervention:      Option<String>,
  /// Always blank; left for the analyst to fill in.
  pub intervention_type: Option<String>,
}

pub fn write_sponsor_backlog<W: io::Write>(
  writer: W,
  rows: &[SponsorBacklog],
) -> Result<()> {
  write_rows(writer, &["Primary_sponsor", "TrialID"], rows)
}

pub fn write_intervention_backlog<W: io::Write>(
  writer: W,
  rows: &[InterventionBacklog],
) -> Result<()> {
  write_rows(
    writer,
    &["TrialID", "Public_title", "Intervention", "intervention_type"],
    rows,
  )
}

/// Write `header` then `rows`. The header is written explicitly so an empty
/// table still gets one.
pub(crate) fn write_rows<W: io::Write, T: Serialize>(
  writer: W,
  header: &[&str],
  rows: &[T],
) -> Result<()> {
  let mut wtr = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(writer);
  wtr.write_record(header)?;
  for row in rows {
    wtr.serialize(row)?;
  }
  wtr.flush()?;
  Ok(())
}
