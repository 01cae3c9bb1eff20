//! CSV tables read and written around the pipeline.
//!
//! Inputs: the prior week's snapshot (for `first_seen`), the sponsor
//! normalisation schedule and the intervention-type assessments. Outputs: the
//! weekly snapshot, the weekly counts and the two curation backlogs.
//!
//! Every reader takes any `io::Read` and every writer any `io::Write`; the
//! `*_path` helpers open files for the binary.

mod curation;
mod first_seen;
mod lookup;
mod snapshot;

pub mod error;

pub use curation::{
  InterventionBacklog, SponsorBacklog, write_intervention_backlog,
  write_sponsor_backlog,
};
pub use error::{Error, Result};
pub use first_seen::FirstSeenTable;
pub use lookup::{InterventionTypes, SponsorSchedule};
pub use snapshot::{
  read_snapshot, read_snapshot_path, write_snapshot, write_weekly_counts,
};
