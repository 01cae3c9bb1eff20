//! The four subcommands. Each returns what `main` prints; files are written
//! here.

use std::{
  fs::{self, File},
  io::{BufReader, BufWriter, Write},
  path::Path,
};

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use ictrp_core::{
  snapshot::{SnapshotRow, WeeklyCount},
  trial::{RawTrial, TrialField},
};
use ictrp_pipeline::{
  RunReport, ValueCount, prepare_unnormalised, select::RegistryCount,
  trend::weekly_counts,
};
use ictrp_tables::{
  FirstSeenTable, InterventionTypes, SponsorSchedule, read_snapshot_path,
  write_intervention_backlog, write_snapshot, write_sponsor_backlog,
  write_weekly_counts,
};
use ictrp_xml::{parse_export, render_trend_chart};

use crate::RunConfig;

pub const SPONSOR_BACKLOG_FILE: &str = "to_norm.csv";
pub const INTERVENTION_BACKLOG_FILE: &str = "int_to_assess.csv";

// ─── run ─────────────────────────────────────────────────────────────────────

/// Full weekly run.
///
/// Curation backlogs are written (or cleared) first. With
/// `require_converged`, an unconverged run stops there and no snapshot is
/// written.
pub fn run(cfg: &RunConfig, require_converged: bool) -> anyhow::Result<RunReport> {
  let settings = cfg.settings()?;
  let raw = read_export(cfg.export_path()?)?;
  let first_seen = read_first_seen(cfg.prior_snapshot_path.as_deref())?;

  let schedule_path = cfg.sponsor_schedule_path()?;
  let schedule = SponsorSchedule::from_path(schedule_path).with_context(|| {
    format!("failed to read sponsor schedule {}", schedule_path.display())
  })?;
  let types_path = cfg.intervention_types_path()?;
  let types = InterventionTypes::from_path(types_path).with_context(|| {
    format!("failed to read intervention types {}", types_path.display())
  })?;

  let outcome =
    ictrp_pipeline::run(raw, &first_seen, &schedule, &types, &settings)?;

  fs::create_dir_all(&cfg.output_dir).with_context(|| {
    format!("failed to create {}", cfg.output_dir.display())
  })?;

  let sponsor_path = cfg.output_dir.join(SPONSOR_BACKLOG_FILE);
  if outcome.sponsor_backlog.is_empty() {
    remove_stale(&sponsor_path)?;
  } else {
    write_file(&sponsor_path, |w| {
      write_sponsor_backlog(w, &outcome.sponsor_backlog)
    })?;
  }
  let intervention_path = cfg.output_dir.join(INTERVENTION_BACKLOG_FILE);
  if outcome.intervention_backlog.is_empty() {
    remove_stale(&intervention_path)?;
  } else {
    write_file(&intervention_path, |w| {
      write_intervention_backlog(w, &outcome.intervention_backlog)
    })?;
  }

  if require_converged && !outcome.converged() {
    bail!(
      "lookups not converged: {} sponsors in {}, {} trials in {}",
      outcome.report.unmatched_sponsors,
      sponsor_path.display(),
      outcome.report.unassessed_interventions,
      intervention_path.display(),
    );
  }

  let date = settings.this_extract_date;
  let rows = outcome.snapshot_rows();
  write_file(&cfg.dated_output("trial_list", date, "csv"), |w| {
    write_snapshot(w, &rows)
  })?;
  write_trend(cfg, date, &outcome.weeks)?;

  let report_path = cfg.dated_output("run_report", date, "json");
  write_file(&report_path, |w| serde_json::to_writer_pretty(w, &outcome.report))?;

  tracing::info!(
    output_dir = %cfg.output_dir.display(),
    fingerprint = %outcome.report.fingerprint,
    "wrote snapshot"
  );
  Ok(outcome.report)
}

// ─── registries ──────────────────────────────────────────────────────────────

/// Export rows per `Source_Register`.
pub fn registries(cfg: &RunConfig) -> anyhow::Result<Vec<RegistryCount>> {
  let raw = read_export(cfg.export_path()?)?;
  Ok(ictrp_pipeline::select::registry_counts(&raw))
}

// ─── fields ──────────────────────────────────────────────────────────────────

/// Distinct values of one field after filtering, before normalisation, for
/// spotting new spellings that need a rule.
pub fn fields(cfg: &RunConfig, field: &str) -> anyhow::Result<Vec<ValueCount>> {
  let field = TrialField::parse(field)?;
  let settings = cfg.settings()?;
  let raw = read_export(cfg.export_path()?)?;
  let first_seen = read_first_seen(cfg.prior_snapshot_path.as_deref())?;

  let prepared = prepare_unnormalised(raw, &first_seen, &settings)?;
  Ok(ictrp_pipeline::unique_values(&prepared.records, field))
}

// ─── trend ───────────────────────────────────────────────────────────────────

/// Rebuild the weekly CSV and chart from an existing snapshot.
///
/// Output files are dated with `this_extract_date`, or the latest
/// `first_seen` in the snapshot when that is not configured.
pub fn trend(
  cfg: &RunConfig,
  snapshot: &Path,
) -> anyhow::Result<Vec<WeeklyCount>> {
  let rows = read_snapshot_path(snapshot)
    .with_context(|| format!("failed to read snapshot {}", snapshot.display()))?;

  let date = match cfg.this_extract_date {
    Some(date) => date,
    None => latest_first_seen(&rows).with_context(|| {
      format!(
        "{} has no first_seen dates; set this_extract_date",
        snapshot.display()
      )
    })?,
  };

  let weeks = weekly_counts(
    rows.iter().map(|r| r.date_registration),
    cfg.registration_cutoff,
  );
  fs::create_dir_all(&cfg.output_dir).with_context(|| {
    format!("failed to create {}", cfg.output_dir.display())
  })?;
  write_trend(cfg, date, &weeks)?;
  Ok(weeks)
}

fn latest_first_seen(rows: &[SnapshotRow]) -> Option<NaiveDate> {
  rows.iter().filter_map(|r| r.first_seen).max()
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn read_export(path: &Path) -> anyhow::Result<Vec<RawTrial>> {
  let file = File::open(path)
    .with_context(|| format!("failed to open export {}", path.display()))?;
  let trials = parse_export(BufReader::new(file))
    .with_context(|| format!("failed to parse export {}", path.display()))?;
  tracing::info!(trials = trials.len(), path = %path.display(), "read export");
  Ok(trials)
}

fn read_first_seen(path: Option<&Path>) -> anyhow::Result<FirstSeenTable> {
  match path {
    Some(path) => FirstSeenTable::from_path(path).with_context(|| {
      format!("failed to read prior snapshot {}", path.display())
    }),
    None => {
      tracing::info!("no prior snapshot configured; every trial is new");
      Ok(FirstSeenTable::empty())
    }
  }
}

fn write_trend(
  cfg: &RunConfig,
  date: NaiveDate,
  weeks: &[WeeklyCount],
) -> anyhow::Result<()> {
  write_file(&cfg.dated_output("trial_count", date, "csv"), |w| {
    write_weekly_counts(w, weeks)
  })?;
  let svg = render_trend_chart(weeks, &cfg.chart_options())
    .context("failed to render trend chart")?;
  write_file(&cfg.dated_output("trial_count", date, "svg"), |w| {
    w.write_all(&svg)
  })
}

/// Create `path` and hand a buffered writer to `write`.
fn write_file<F, E>(path: &Path, write: F) -> anyhow::Result<()>
where
  F: FnOnce(&mut BufWriter<File>) -> Result<(), E>,
  E: std::error::Error + Send + Sync + 'static,
{
  let file = File::create(path)
    .with_context(|| format!("failed to create {}", path.display()))?;
  let mut writer = BufWriter::new(file);
  write(&mut writer)
    .with_context(|| format!("failed to write {}", path.display()))?;
  writer
    .flush()
    .with_context(|| format!("failed to write {}", path.display()))?;
  tracing::debug!(path = %path.display(), "wrote file");
  Ok(())
}

/// Delete a backlog left over from an earlier, unconverged run.
fn remove_stale(path: &Path) -> anyhow::Result<()> {
  if path.exists() {
    fs::remove_file(path)
      .with_context(|| format!("failed to remove {}", path.display()))?;
    tracing::info!(path = %path.display(), "removed stale curation file");
  }
  Ok(())
}
