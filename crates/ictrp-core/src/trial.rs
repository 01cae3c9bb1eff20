//! Trial records: the raw export row and the cleaned record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result, registry::Registry};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The export columns the pipeline keeps. Every other element of a `<Trial>`
/// is dropped on read.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum TrialField {
  #[strum(to_string = "trial_id", serialize = "trialid")]
  TrialId,
  SourceRegister,
  DateRegistration,
  #[strum(to_string = "date_enrollement", serialize = "date_enrollment")]
  DateEnrollement,
  PrimarySponsor,
  RecruitmentStatus,
  Phase,
  StudyType,
  Countries,
  PublicTitle,
  Intervention,
  WebAddress,
  ResultsUrlLink,
  LastRefreshedOn,
}

impl TrialField {
  /// Element name in the ICTRP XML export.
  pub fn element_name(self) -> &'static str {
    match self {
      Self::TrialId => "TrialID",
      Self::SourceRegister => "Source_Register",
      Self::DateRegistration => "Date_registration",
      Self::DateEnrollement => "Date_enrollement",
      Self::PrimarySponsor => "Primary_sponsor",
      Self::RecruitmentStatus => "Recruitment_Status",
      Self::Phase => "Phase",
      Self::StudyType => "Study_type",
      Self::Countries => "Countries",
      Self::PublicTitle => "Public_title",
      Self::Intervention => "Intervention",
      Self::WebAddress => "web_address",
      Self::ResultsUrlLink => "results_url_link",
      Self::LastRefreshedOn => "Last_Refreshed_on",
    }
  }

  /// Parse a user-supplied field name (`study_type`, `Study_type`,
  /// `trialid`, ...).
  pub fn parse(name: &str) -> Result<Self> {
    name
      .trim()
      .parse()
      .map_err(|_| Error::UnknownField(name.to_string()))
  }

  /// Inverse of [`element_name`](Self::element_name). Exact match; the export
  /// is consistent about case.
  pub fn from_element_name(name: &[u8]) -> Option<Self> {
    use strum::IntoEnumIterator;
    Self::iter().find(|f| f.element_name().as_bytes() == name)
  }
}

// ─── Raw ─────────────────────────────────────────────────────────────────────

/// One `<Trial>` from the export, restricted to the kept columns.
///
/// Values are trimmed; an empty or absent element is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrial {
  pub trial_id:           String,
  pub source_register:    Option<String>,
  pub date_registration:  Option<String>,
  pub date_enrollement:   Option<String>,
  pub primary_sponsor:    Option<String>,
  pub recruitment_status: Option<String>,
  pub phase:              Option<String>,
  pub study_type:         Option<String>,
  pub countries:          Option<String>,
  pub public_title:       Option<String>,
  pub intervention:       Option<String>,
  pub web_address:        Option<String>,
  pub results_url_link:   Option<String>,
  pub last_refreshed_on:  Option<String>,
}

impl RawTrial {
  /// Store `value` under `field`. Blank values become `None`.
  pub fn set(&mut self, field: TrialField, value: &str) {
    let value = value.trim();
    let slot = match field {
      TrialField::TrialId => {
        self.trial_id = value.to_string();
        return;
      }
      TrialField::SourceRegister => &mut self.source_register,
      TrialField::DateRegistration => &mut self.date_registration,
      TrialField::DateEnrollement => &mut self.date_enrollement,
      TrialField::PrimarySponsor => &mut self.primary_sponsor,
      TrialField::RecruitmentStatus => &mut self.recruitment_status,
      TrialField::Phase => &mut self.phase,
      TrialField::StudyType => &mut self.study_type,
      TrialField::Countries => &mut self.countries,
      TrialField::PublicTitle => &mut self.public_title,
      TrialField::Intervention => &mut self.intervention,
      TrialField::WebAddress => &mut self.web_address,
      TrialField::ResultsUrlLink => &mut self.results_url_link,
      TrialField::LastRefreshedOn => &mut self.last_refreshed_on,
    };
    *slot = (!value.is_empty()).then(|| value.to_string());
  }
}

// ─── Cleaned ─────────────────────────────────────────────────────────────────

/// A trial after date parsing, with the carried-forward `first_seen`.
///
/// Text columns are normalised in place by the pipeline; the lookup columns
/// (`normed_sponsor`, `intervention_type`) stay `None` until the curated
/// tables are merged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
  pub trial_id:           String,
  pub registry:           Option<Registry>,
  pub source_register:    Option<String>,
  pub date_registration:  NaiveDate,
  pub date_enrollment:    Option<NaiveDate>,
  pub primary_sponsor:    Option<String>,
  pub normed_sponsor:     Option<String>,
  pub recruitment_status: Option<String>,
  pub phase:              Option<String>,
  pub study_type:         Option<String>,
  pub countries:          Option<String>,
  pub public_title:       Option<String>,
  pub intervention:       Option<String>,
  pub intervention_type:  Option<String>,
  pub web_address:        Option<String>,
  pub results_url_link:   Option<String>,
  pub last_refreshed_on:  Option<NaiveDate>,
  pub first_seen:         NaiveDate,
}

impl TrialRecord {
  /// The value of `field` rendered as text, for field inspection.
  pub fn field_value(&self, field: TrialField) -> Option<String> {
    let date = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();
    match field {
      TrialField::TrialId => Some(self.trial_id.clone()),
      TrialField::SourceRegister => self.source_register.clone(),
      TrialField::DateRegistration => Some(date(&self.date_registration)),
      TrialField::DateEnrollement => self.date_enrollment.as_ref().map(date),
      TrialField::PrimarySponsor => self.primary_sponsor.clone(),
      TrialField::RecruitmentStatus => self.recruitment_status.clone(),
      TrialField::Phase => self.phase.clone(),
      TrialField::StudyType => self.study_type.clone(),
      TrialField::Countries => self.countries.clone(),
      TrialField::PublicTitle => self.public_title.clone(),
      TrialField::Intervention => self.intervention.clone(),
      TrialField::WebAddress => self.web_address.clone(),
      TrialField::ResultsUrlLink => self.results_url_link.clone(),
      TrialField::LastRefreshedOn => self.last_refreshed_on.as_ref().map(date),
    }
  }

  /// Title mentions cancellation, or the registry marks it withdrawn.
  pub fn is_cancelled(&self) -> bool {
    self
      .public_title
      .as_deref()
      .is_some_and(|t| t.contains("Cancelled"))
      || self.recruitment_status.as_deref() == Some("Withdrawn")
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn field_names_parse_loosely() {
    assert_eq!(
      TrialField::from_str("study_type").unwrap(),
      TrialField::StudyType
    );
    assert_eq!(
      TrialField::from_str("Recruitment_Status").unwrap(),
      TrialField::RecruitmentStatus
    );
    assert_eq!(TrialField::from_str("trialid").unwrap(), TrialField::TrialId);
    assert!(TrialField::from_str("target_size").is_err());
  }

  #[test]
  fn unknown_field_names_the_input() {
    assert_eq!(TrialField::parse(" phase ").unwrap(), TrialField::Phase);
    let err = TrialField::parse("target_size").unwrap_err();
    assert_eq!(err.to_string(), "unknown trial field: \"target_size\"");
  }

  #[test]
  fn element_names_round_trip() {
    assert_eq!(
      TrialField::from_element_name(b"Date_enrollement"),
      Some(TrialField::DateEnrollement)
    );
    assert_eq!(
      TrialField::from_element_name(b"web_address"),
      Some(TrialField::WebAddress)
    );
    assert_eq!(TrialField::from_element_name(b"Target_size"), None);
  }

  #[test]
  fn set_blanks_become_none() {
    let mut raw = RawTrial::default();
    raw.set(TrialField::TrialId, " NCT04280705 ");
    raw.set(TrialField::Phase, "   ");
    raw.set(TrialField::Countries, "China");
    assert_eq!(raw.trial_id, "NCT04280705");
    assert_eq!(raw.phase, None);
    assert_eq!(raw.countries.as_deref(), Some("China"));
  }
}
