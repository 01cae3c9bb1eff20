//! The weekly snapshot (`trial_list_<date>.csv`) and weekly counts
//! (`trial_count_<date>.csv`).

use std::{fs::File, io, path::Path};

use ictrp_core::snapshot::{SNAPSHOT_COLUMNS, SnapshotRow, WeeklyCount};

use crate::{
  curation::write_rows,
  error::{Error, Result},
};

pub fn write_snapshot<W: io::Write>(
  writer: W,
  rows: &[SnapshotRow],
) -> Result<()> {
  write_rows(writer, &SNAPSHOT_COLUMNS, rows)
}

/// Read a snapshot back, e.g. to redraw the chart. Extra columns are ignored.
pub fn read_snapshot<R: io::Read>(reader: R) -> Result<Vec<SnapshotRow>> {
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader);
  let rows = rdr.deserialize().collect::<Result<Vec<SnapshotRow>, _>>()?;
  Ok(rows)
}

pub fn read_snapshot_path(path: &Path) -> Result<Vec<SnapshotRow>> {
  let file = File::open(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  read_snapshot(file)
}

pub fn write_weekly_counts<W: io::Write>(
  writer: W,
  weeks: &[WeeklyCount],
) -> Result<()> {
  write_rows(
    writer,
    &["week_ending", "new_trials", "cumulative_trials"],
    weeks,
  )
}
