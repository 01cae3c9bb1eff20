//! Runs the commands against files in a temporary directory.

use std::{fs, path::Path};

use chrono::NaiveDate;
use ictrp_cli::{
  RunConfig,
  commands::{self, INTERVENTION_BACKLOG_FILE, SPONSOR_BACKLOG_FILE},
};
use ictrp_pipeline::RunReport;
use ictrp_tables::read_snapshot_path;

const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Trials_downloaded_from_ICTRP>
  <Trial>
    <Internal_Number>1</Internal_Number>
    <TrialID>NCT04280705</TrialID>
    <Last_Refreshed_on>16 March 2020</Last_Refreshed_on>
    <Public_title>Adaptive COVID-19 Treatment Trial</Public_title>
    <Primary_sponsor>National Institute of Allergy and Infectious Diseases (NIAID)</Primary_sponsor>
    <Date_registration>21/02/2020</Date_registration>
    <Date_enrollement>February 21, 2020</Date_enrollement>
    <Source_Register>ClinicalTrials.gov</Source_Register>
    <Recruitment_Status>Recruiting</Recruitment_Status>
    <Countries>United States;Korea, Republic of;United States</Countries>
    <Intervention>Drug: Remdesivir;Other: Placebo</Intervention>
    <Study_type>Interventional</Study_type>
    <Phase>Phase 3</Phase>
  </Trial>
  <Trial>
    <TrialID>ChiCTR2000029308</TrialID>
    <Public_title>A randomized, controlled open-label trial of lopinavir-ritonavir</Public_title>
    <Primary_sponsor>Jin Yin-Tan Hospital</Primary_sponsor>
    <Date_registration>2020-01-23</Date_registration>
    <Date_enrollement>2020-01-18</Date_enrollement>
    <Source_Register>ChiCTR</Source_Register>
    <Recruitment_Status>Not recruiting</Recruitment_Status>
    <Countries>Wuhan</Countries>
    <Study_type>Interventional study</Study_type>
  </Trial>
  <Trial>
    <TrialID>NCT04252274</TrialID>
    <Public_title>Cancelled: Efficacy of traditional medicine</Public_title>
    <Date_registration>05/02/2020</Date_registration>
    <Source_Register>ClinicalTrials.gov</Source_Register>
  </Trial>
  <Trial>
    <TrialID>NCT03331445</TrialID>
    <Public_title>Influenza vaccine trial</Public_title>
    <Date_registration>06/11/2017</Date_registration>
    <Source_Register>ClinicalTrials.gov</Source_Register>
  </Trial>
</Trials_downloaded_from_ICTRP>"#;

const PRIOR: &str = "\
trialid,source_register,first_seen
ChiCTR2000029308,ChiCTR,2020-03-08
";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config(dir: &Path, schedule: &str, types: &str) -> RunConfig {
  fs::write(dir.join("export.xml"), EXPORT).unwrap();
  fs::write(dir.join("prior.csv"), PRIOR).unwrap();
  fs::write(dir.join("schedule.csv"), schedule).unwrap();
  fs::write(dir.join("types.csv"), types).unwrap();

  let toml = format!(
    r#"
export_path = "{dir}/export.xml"
prior_snapshot_path = "{dir}/prior.csv"
sponsor_schedule_path = "{dir}/schedule.csv"
intervention_types_path = "{dir}/types.csv"
output_dir = "{dir}/out"
prior_extract_date = "2020-03-11"
this_extract_date = "2020-03-18"
"#,
    dir = dir.display()
  );
  let path = dir.join("ictrp.toml");
  fs::write(&path, toml).unwrap();
  RunConfig::load(&path).unwrap()
}

const FULL_SCHEDULE: &str = "\
unique_spon_names,normed_spon_names
National Institute of Allergy and Infectious Diseases (NIAID),NIAID
Jin Yin-Tan Hospital,Jinyintan Hospital
";

const FULL_TYPES: &str = "\
trial_id,intervention_type
NCT04280705,Drug
ChiCTR2000029308,Drug
";

#[test]
fn unconverged_run_writes_backlogs() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(
    dir.path(),
    "unique_spon_names,normed_spon_names\n",
    "trial_id,intervention_type\n",
  );

  let report = commands::run(&cfg, false).unwrap();
  assert!(!report.converged);
  assert_eq!(report.unmatched_sponsors, 2);

  let out = dir.path().join("out");
  let backlog = fs::read_to_string(out.join(SPONSOR_BACKLOG_FILE)).unwrap();
  assert_eq!(
    backlog,
    "Primary_sponsor,TrialID\nJin Yin-Tan Hospital,1\n\
     National Institute of Allergy and Infectious Diseases (NIAID),1\n"
  );
  let assess = fs::read_to_string(out.join(INTERVENTION_BACKLOG_FILE)).unwrap();
  assert!(assess.contains("NCT04280705,Adaptive COVID-19 Treatment Trial,"));
  assert!(assess.contains("Drug: RemdesivirOther: Placebo"));

  // The snapshot is still written, with empty lookup cells.
  let rows = read_snapshot_path(&out.join("trial_list_2020-03-18.csv")).unwrap();
  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|r| r.normed_spon_names.is_none()));
}

#[test]
fn require_converged_blocks_the_snapshot() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(
    dir.path(),
    FULL_SCHEDULE,
    "trial_id,intervention_type\n",
  );

  let err = commands::run(&cfg, true).unwrap_err();
  assert!(err.to_string().contains("not converged"));
  let out = dir.path().join("out");
  assert!(out.join(INTERVENTION_BACKLOG_FILE).exists());
  assert!(!out.join(SPONSOR_BACKLOG_FILE).exists());
  assert!(!out.join("trial_list_2020-03-18.csv").exists());
}

#[test]
fn converged_run_writes_every_output() {
  let dir = tempfile::tempdir().unwrap();
  let out = dir.path().join("out");
  fs::create_dir_all(&out).unwrap();
  fs::write(out.join(SPONSOR_BACKLOG_FILE), "stale").unwrap();

  let cfg = config(dir.path(), FULL_SCHEDULE, FULL_TYPES);
  let report = commands::run(&cfg, true).unwrap();

  assert!(report.converged);
  assert_eq!(report.input_trials, 4);
  assert_eq!(report.pre_cutoff_excluded, 1);
  assert_eq!(report.cancelled_excluded, 1);
  assert_eq!(report.output_trials, 2);
  assert_eq!(report.new_trials, 1);
  assert!(report.refreshed.is_empty());
  assert!(!out.join(SPONSOR_BACKLOG_FILE).exists());

  let rows = read_snapshot_path(&out.join("trial_list_2020-03-18.csv")).unwrap();
  let chi = &rows[0];
  assert_eq!(chi.trialid, "ChiCTR2000029308");
  assert_eq!(chi.first_seen, Some(ymd(2020, 3, 8)));
  assert_eq!(chi.countries.as_deref(), Some("China"));
  assert_eq!(chi.study_type.as_deref(), Some("Interventional"));
  assert_eq!(chi.recruitment_status.as_deref(), Some("Not Recruiting"));
  assert_eq!(chi.normed_spon_names.as_deref(), Some("Jinyintan Hospital"));

  let nct = &rows[1];
  assert_eq!(nct.first_seen, Some(ymd(2020, 3, 18)));
  assert_eq!(nct.date_enrollement, Some(ymd(2020, 2, 21)));
  assert_eq!(nct.countries.as_deref(), Some("South Korea; United States"));
  assert_eq!(nct.intervention_type.as_deref(), Some("Drug"));

  let counts =
    fs::read_to_string(out.join("trial_count_2020-03-18.csv")).unwrap();
  assert!(counts.starts_with("week_ending,new_trials,cumulative_trials\n"));
  assert!(counts.contains("2020-01-26,1,1\n"));
  assert!(counts.ends_with("2020-02-23,1,2\n"));

  let svg = fs::read_to_string(out.join("trial_count_2020-03-18.svg")).unwrap();
  assert!(svg.contains("<svg"));

  let json = fs::read_to_string(out.join("run_report_2020-03-18.json")).unwrap();
  let saved: RunReport = serde_json::from_str(&json).unwrap();
  assert_eq!(saved, report);
}

#[test]
fn rerun_with_same_inputs_has_same_fingerprint() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(dir.path(), FULL_SCHEDULE, FULL_TYPES);
  let first = commands::run(&cfg, false).unwrap();
  let second = commands::run(&cfg, false).unwrap();
  assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn registries_and_fields() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(dir.path(), FULL_SCHEDULE, FULL_TYPES);

  let registries = commands::registries(&cfg).unwrap();
  assert_eq!(registries[0].source_register, "ClinicalTrials.gov");
  assert_eq!(registries[0].trials, 3);

  let values = commands::fields(&cfg, "Recruitment_Status").unwrap();
  let values: Vec<_> = values
    .iter()
    .map(|v| v.value.as_deref().unwrap_or(""))
    .collect();
  // Raw spelling: the field listing runs before normalisation.
  assert_eq!(values, ["Not recruiting", "Recruiting"]);

  assert!(commands::fields(&cfg, "target_size").is_err());
}

#[test]
fn trend_from_snapshot() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(dir.path(), FULL_SCHEDULE, FULL_TYPES);
  commands::run(&cfg, false).unwrap();

  let snapshot = dir.path().join("out").join("trial_list_2020-03-18.csv");
  let weeks = commands::trend(&cfg, &snapshot).unwrap();
  assert_eq!(weeks.len(), 5);
  assert_eq!(weeks.last().unwrap().cumulative_trials, 2);
}

#[test]
fn trend_dates_outputs_from_snapshot_without_extract_date() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(dir.path(), FULL_SCHEDULE, FULL_TYPES);
  commands::run(&cfg, false).unwrap();
  let snapshot = dir.path().join("out").join("trial_list_2020-03-18.csv");

  let redraw = dir.path().join("redraw");
  let cfg = RunConfig {
    this_extract_date: None,
    output_dir: redraw.clone(),
    ..cfg
  };
  commands::trend(&cfg, &snapshot).unwrap();

  // The newest first_seen in the snapshot is the NCT trial's 2020-03-18.
  assert!(redraw.join("trial_count_2020-03-18.csv").exists());
  assert!(redraw.join("trial_count_2020-03-18.svg").exists());
}

#[test]
fn trend_without_any_date_is_an_error() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = config(dir.path(), FULL_SCHEDULE, FULL_TYPES);
  let snapshot = dir.path().join("empty.csv");
  fs::write(&snapshot, "").unwrap();

  let cfg = RunConfig {
    this_extract_date: None,
    ..cfg
  };
  let err = commands::trend(&cfg, &snapshot).unwrap_err();
  assert!(err.to_string().contains("no first_seen dates"));
}
