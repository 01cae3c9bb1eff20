//! `ictrp`: weekly ICTRP trial-list snapshot.
//!
//! Reads `ictrp.toml` (or the path given with `--config`) layered under
//! `ICTRP_*` environment variables.
//!
//! # Usage
//!
//! ```text
//! ictrp run                          # snapshot, backlogs, chart, report
//! ictrp run --require-converged      # refuse to snapshot with open backlogs
//! ictrp registries                   # rows per Source_Register
//! ictrp fields --field study_type    # distinct values as registered
//! ictrp trend --snapshot trial_list_2020-03-18.csv
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ictrp_cli::{RunConfig, commands};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "ICTRP weekly trial-list pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ictrp.toml")]
  config: PathBuf,

  /// Log line format.
  #[arg(long, value_enum, default_value_t = LogFormat::Text)]
  log_format: LogFormat,

  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
  Text,
  Json,
}

#[derive(Subcommand)]
enum Command {
  /// Run the full pipeline and write this week's outputs.
  Run {
    /// Fail before writing the snapshot if any lookup is unmatched.
    #[arg(long)]
    require_converged: bool,
  },
  /// Count export rows per source registry.
  Registries,
  /// Print the distinct values of one field after filtering.
  Fields {
    /// Field name, e.g. `study_type` or `recruitment_status`.
    #[arg(long)]
    field: String,
  },
  /// Rebuild the weekly counts and chart from a snapshot CSV.
  Trend {
    #[arg(long)]
    snapshot: PathBuf,
  },
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.log_format);

  let cfg = RunConfig::load(&cli.config)?;

  match cli.command {
    Command::Run { require_converged } => {
      let report = commands::run(&cfg, require_converged)?;
      println!(
        "{} trials written ({} new); converged: {}",
        report.output_trials, report.new_trials, report.converged
      );
      for id in &report.refreshed {
        println!("refreshed: {id}");
      }
    }
    Command::Registries => {
      for count in commands::registries(&cfg)? {
        println!("{}\t{}", count.trials, count.source_register);
      }
    }
    Command::Fields { field } => {
      for count in commands::fields(&cfg, &field)? {
        let value = count.value.as_deref().unwrap_or("<empty>");
        println!("{}\t{value}", count.trials);
      }
    }
    Command::Trend { snapshot } => {
      for week in commands::trend(&cfg, &snapshot)? {
        println!(
          "{}\t{}\t{}",
          week.week_ending, week.new_trials, week.cumulative_trials
        );
      }
    }
  }

  Ok(())
}

/// Logs go to stderr so command output on stdout stays pipeable.
fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr);

  match format {
    LogFormat::Text => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}
