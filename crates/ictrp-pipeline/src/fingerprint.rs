//! Content hash of a snapshot.
//!
//! SHA-256 over every column of every row, rows sorted by TrialID. Two runs
//! that would write byte-identical snapshots get the same fingerprint
//! whatever order the export listed trials in.

use ictrp_core::snapshot::SnapshotRow;
use sha2::{Digest, Sha256};

/// Hex-encoded fingerprint of `rows`.
pub fn snapshot_fingerprint(rows: &[SnapshotRow]) -> String {
  let mut sorted: Vec<&SnapshotRow> = rows.iter().collect();
  sorted.sort_by(|a, b| a.trialid.cmp(&b.trialid));

  let mut hasher = Sha256::new();
  for row in sorted {
    for cell in cells(row) {
      // Length prefix keeps ("ab", "c") distinct from ("a", "bc").
      let cell = cell.unwrap_or_default();
      hasher.update((cell.len() as u64).to_le_bytes());
      hasher.update(cell.as_bytes());
    }
  }
  hex::encode(hasher.finalize())
}

fn cells(row: &SnapshotRow) -> [Option<String>; 15] {
  let date = |d: chrono::NaiveDate| d.format("%Y-%m-%d").to_string();
  [
    Some(row.trialid.clone()),
    row.source_register.clone(),
    Some(date(row.date_registration)),
    row.date_enrollement.map(date),
    row.normed_spon_names.clone(),
    row.recruitment_status.clone(),
    row.phase.clone(),
    row.study_type.clone(),
    row.countries.clone(),
    row.public_title.clone(),
    row.intervention_type.clone(),
    row.web_address.clone(),
    row.results_url_link.clone(),
    row.last_refreshed_on.map(date),
    row.first_seen.map(date),
  ]
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn row(id: &str, phase: Option<&str>) -> SnapshotRow {
    SnapshotRow {
      trialid:            id.into(),
      source_register:    Some("ClinicalTrials.gov".into()),
      date_registration:  NaiveDate::from_ymd_opt(2020, 2, 21).unwrap(),
      date_enrollement:   None,
      normed_spon_names:  None,
      recruitment_status: None,
      phase:              phase.map(Into::into),
      study_type:         None,
      countries:          None,
      public_title:       None,
      intervention_type:  None,
      web_address:        None,
      results_url_link:   None,
      last_refreshed_on:  None,
      first_seen:         None,
    }
  }

  #[test]
  fn row_order_does_not_matter() {
    let a = [row("NCT1", None), row("NCT2", Some("Phase 2"))];
    let b = [row("NCT2", Some("Phase 2")), row("NCT1", None)];
    assert_eq!(snapshot_fingerprint(&a), snapshot_fingerprint(&b));
    assert_eq!(snapshot_fingerprint(&a).len(), 64);
  }

  #[test]
  fn any_cell_change_is_visible() {
    let a = [row("NCT1", Some("Phase 2"))];
    let b = [row("NCT1", Some("Phase 3"))];
    assert_ne!(snapshot_fingerprint(&a), snapshot_fingerprint(&b));
  }

  #[test]
  fn cell_boundaries_matter() {
    let mut a = row("NCT1", Some("Phase 2"));
    a.study_type = Some("Interventional".into());
    let mut b = row("NCT1", Some("Phase 2Interventional"));
    b.study_type = None;
    assert_ne!(snapshot_fingerprint(&[a]), snapshot_fingerprint(&[b]));
  }
}
