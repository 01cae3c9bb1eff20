//! Command implementations behind the `ictrp` binary.
//!
//! Each command reads the files named in [`RunConfig`], runs the pure steps
//! from `ictrp-pipeline`, and writes its outputs into `output_dir`.

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use ictrp_pipeline::{NormalizationRules, RunSettings};
use ictrp_xml::ChartOptions;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Run configuration, deserialised from `ictrp.toml` and `ICTRP_*`
/// environment variables.
///
/// Inputs are optional here because not every command needs every file;
/// each command checks for what it uses.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
  /// ICTRP XML export.
  pub export_path:             Option<PathBuf>,
  /// Last week's `trial_list_<date>.csv`. Absent on the first run.
  pub prior_snapshot_path:     Option<PathBuf>,
  pub sponsor_schedule_path:   Option<PathBuf>,
  pub intervention_types_path: Option<PathBuf>,
  #[serde(default = "default_output_dir")]
  pub output_dir:              PathBuf,
  pub prior_extract_date:      Option<NaiveDate>,
  pub this_extract_date:       Option<NaiveDate>,
  #[serde(default = "ictrp_pipeline::default_cutoff")]
  pub registration_cutoff:     NaiveDate,
  pub chart_title:             Option<String>,
  #[serde(default)]
  pub extra_country_aliases:   Vec<Alias>,
  #[serde(default)]
  pub extra_sponsor_aliases:   Vec<Alias>,
}

/// An exact replacement added to the normalisation rules.
///
/// Written as a list of `{ from, to }` tables because the config loader
/// lowercases map keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Alias {
  pub from: String,
  pub to:   String,
}

fn pairs(aliases: &[Alias]) -> impl Iterator<Item = (String, String)> + '_ {
  aliases.iter().map(|a| (a.from.clone(), a.to.clone()))
}

fn default_output_dir() -> PathBuf { PathBuf::from(".") }

impl RunConfig {
  /// Layer the TOML file at `path` (if present) under `ICTRP_*` environment
  /// variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ICTRP"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise RunConfig")
  }

  pub fn export_path(&self) -> anyhow::Result<&Path> {
    required(self.export_path.as_deref(), "export_path")
  }

  pub fn sponsor_schedule_path(&self) -> anyhow::Result<&Path> {
    required(self.sponsor_schedule_path.as_deref(), "sponsor_schedule_path")
  }

  pub fn intervention_types_path(&self) -> anyhow::Result<&Path> {
    required(
      self.intervention_types_path.as_deref(),
      "intervention_types_path",
    )
  }

  pub fn this_extract_date(&self) -> anyhow::Result<NaiveDate> {
    self
      .this_extract_date
      .context("this_extract_date is not set (ICTRP_THIS_EXTRACT_DATE)")
  }

  /// Pipeline settings: the dates plus the default normalisation rules with
  /// the configured aliases on top.
  pub fn settings(&self) -> anyhow::Result<RunSettings> {
    let rules = NormalizationRules::default()
      .with_country_aliases(pairs(&self.extra_country_aliases))
      .with_sponsor_aliases(pairs(&self.extra_sponsor_aliases));
    Ok(RunSettings {
      prior_extract_date: self.prior_extract_date,
      this_extract_date: self.this_extract_date()?,
      registration_cutoff: self.registration_cutoff,
      rules,
    })
  }

  pub fn chart_options(&self) -> ChartOptions {
    let mut opts = ChartOptions::default();
    if let Some(title) = &self.chart_title {
      opts.title = title.clone();
    }
    opts
  }

  /// `<output_dir>/<stem>_<date>.<ext>`
  pub fn dated_output(&self, stem: &str, date: NaiveDate, ext: &str) -> PathBuf {
    self
      .output_dir
      .join(format!("{stem}_{}.{ext}", date.format("%Y-%m-%d")))
  }
}

fn required<'a>(value: Option<&'a Path>, key: &str) -> anyhow::Result<&'a Path> {
  value.with_context(|| {
    format!("{key} is not set (config file or ICTRP_{})", key.to_uppercase())
  })
}
