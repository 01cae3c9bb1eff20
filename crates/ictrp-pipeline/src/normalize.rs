//! Free-text clean-up of the categorical columns.
//!
//! The replacement tables are plain data so a deployment can add aliases in
//! configuration without touching code. All matches are exact and
//! case-sensitive.

use std::collections::BTreeMap;

use ictrp_core::trial::TrialRecord;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

pub const NO_COUNTRY: &str = "No Country Given";
pub const NO_SPONSOR: &str = "No Sponsor Name Given";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationRules {
  /// Substring removed from every study type before `study_types` applies.
  pub study_type_suffix:  String,
  pub study_types:        BTreeMap<String, String>,
  pub recruitment_status: BTreeMap<String, String>,
  pub countries:          BTreeMap<String, String>,
  /// Applied to the sponsor after ASCII folding.
  pub sponsors:           BTreeMap<String, String>,
  pub missing_country:    String,
  pub missing_sponsor:    String,
}

impl Default for NormalizationRules {
  fn default() -> Self {
    let china = [
      "Chian", "China?", "Chinese", "Wuhan", "Chinaese", "china",
    ]
    .into_iter()
    .map(|alias| (alias, "China"));
    let korea = [
      (
        "United States;Korea, Republic of;United States",
        "South Korea; United States",
      ),
      ("Korea, Republic of", "South Korea"),
    ];

    Self {
      study_type_suffix:  " study".into(),
      study_types:        table([(
        "Observational [Patient Registry]",
        "Observational",
      )]),
      recruitment_status: table([("Not recruiting", "Not Recruiting")]),
      countries:          table(china.chain(korea)),
      sponsors:           table([("NA", NO_SPONSOR)]),
      missing_country:    NO_COUNTRY.into(),
      missing_sponsor:    NO_SPONSOR.into(),
    }
  }
}

fn table<'a>(
  pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> BTreeMap<String, String> {
  pairs
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl NormalizationRules {
  /// Add exact country replacements on top of the defaults. Later entries
  /// override earlier ones for the same key.
  pub fn with_country_aliases(
    mut self,
    aliases: impl IntoIterator<Item = (String, String)>,
  ) -> Self {
    self.countries.extend(aliases);
    self
  }

  /// Add exact sponsor replacements, matched after ASCII folding.
  pub fn with_sponsor_aliases(
    mut self,
    aliases: impl IntoIterator<Item = (String, String)>,
  ) -> Self {
    self.sponsors.extend(aliases);
    self
  }

  /// Normalise one record in place.
  pub fn apply(&self, record: &mut TrialRecord) {
    if let Some(intervention) = record.intervention.as_mut() {
      intervention.retain(|c| c != ';');
    }

    if let Some(study_type) = record.study_type.take() {
      let stripped = study_type.replace(&self.study_type_suffix, "");
      record.study_type = Some(replace(&self.study_types, stripped));
    }

    if let Some(status) = record.recruitment_status.take() {
      record.recruitment_status =
        Some(replace(&self.recruitment_status, status));
    }

    let countries = record
      .countries
      .take()
      .unwrap_or_else(|| self.missing_country.clone());
    record.countries = Some(replace(&self.countries, countries));

    let sponsor = match record.primary_sponsor.take() {
      Some(name) => replace(&self.sponsors, fold_ascii(&name)),
      None => self.missing_sponsor.clone(),
    };
    record.primary_sponsor = Some(sponsor);
  }

  pub fn apply_all(&self, records: &mut [TrialRecord]) {
    for record in records.iter_mut() {
      self.apply(record);
    }
    tracing::debug!(trials = records.len(), "normalised free-text columns");
  }
}

fn replace(table: &BTreeMap<String, String>, value: String) -> String {
  match table.get(&value) {
    Some(replacement) => replacement.clone(),
    None => value,
  }
}

/// NFKD-decompose and drop everything outside ASCII, so accented names match
/// their plain spelling in the sponsor schedule. A name with no ASCII left
/// (e.g. written entirely in CJK) is kept as it was.
pub fn fold_ascii(name: &str) -> String {
  let folded: String = name.nfkd().filter(char::is_ascii).collect();
  let folded = folded.trim();
  if folded.is_empty() {
    name.to_string()
  } else {
    folded.to_string()
  }
}
