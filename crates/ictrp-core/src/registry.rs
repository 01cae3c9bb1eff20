//! Source registries and the date conventions each one uses in the ICTRP
//! export.
//!
//! The registry is never read from `Source_Register`; it is detected from the
//! TrialID prefix, which is the only field every export row reliably carries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::date::DateFormat;

/// A trial registry that feeds the ICTRP.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Registry {
  #[strum(to_string = "ClinicalTrials.gov")]
  ClinicalTrialsGov,
  #[strum(to_string = "ChiCTR")]
  ChiCtr,
  #[strum(to_string = "EU Clinical Trials Register")]
  EuCtr,
  #[strum(to_string = "ISRCTN")]
  Isrctn,
  #[strum(to_string = "IRCT")]
  Irct,
  #[strum(to_string = "DRKS")]
  Drks,
  #[strum(to_string = "JPRN")]
  Jprn,
  #[strum(to_string = "CTRI")]
  Ctri,
  #[strum(to_string = "CRiS")]
  Kct,
  #[strum(to_string = "ANZCTR")]
  Actrn,
  #[strum(to_string = "TCTR")]
  Tctr,
  #[strum(to_string = "Netherlands Trial Register")]
  Ntr,
}

impl Registry {
  /// The TrialID prefix that identifies this registry.
  pub fn prefix(self) -> &'static str {
    match self {
      Self::ClinicalTrialsGov => "NCT",
      Self::ChiCtr => "ChiCTR",
      Self::EuCtr => "EUCTR",
      Self::Isrctn => "ISRCTN",
      Self::Irct => "IRCT",
      Self::Drks => "DRKS",
      Self::Jprn => "JPRN",
      Self::Ctri => "CTRI",
      Self::Kct => "KCT",
      Self::Actrn => "ACTRN",
      Self::Tctr => "TCTR",
      Self::Ntr => "NL",
    }
  }

  /// Detect the registry from a TrialID. Returns `None` for prefixes not yet
  /// known; those rows need a human to check the date formats.
  pub fn detect(trial_id: &str) -> Option<Self> {
    let id = trial_id.trim();
    Self::iter().find(|r| id.starts_with(r.prefix()))
  }

  /// Format of `Date_registration` for this registry.
  pub fn registration_format(self) -> DateFormat {
    match self {
      Self::ChiCtr => DateFormat::Exact("%Y-%m-%d"),
      _ => DateFormat::Exact("%d/%m/%Y"),
    }
  }

  /// Format of `Date_enrollement` for this registry.
  ///
  /// ClinicalTrials.gov start dates are free text ("March 2020",
  /// "March 15, 2020") and numeric ones are US-style; most other registries
  /// pass through whatever the registrant typed, so they get the flexible
  /// chain.
  pub fn enrollment_format(self) -> DateFormat {
    match self {
      Self::ChiCtr => DateFormat::Exact("%Y-%m-%d"),
      Self::ClinicalTrialsGov => DateFormat::MonthFirst,
      _ => DateFormat::Flexible,
    }
  }
}
