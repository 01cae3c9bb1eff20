//! Date parsing for the registration, enrollment and refresh columns.
//!
//! Each registry writes dates its own way, so a single parse over the whole
//! column gives wrong answers (day and month swap silently). Dates are
//! parsed per record using the format of the record's registry.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, registry::Registry};

/// Formats tried, in order, when no exact format is known.
pub const FALLBACK_FORMATS: &[&str] =
  &["%d/%m/%Y", "%Y-%m-%d", "%d %B %Y", "%B %d, %Y"];

/// How a date column is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
  /// A single `chrono` format string.
  Exact(&'static str),
  /// Try [`FALLBACK_FORMATS`], then month-and-year ("March 2020", taken as
  /// the first of the month).
  Flexible,
  /// As [`Flexible`](Self::Flexible), but a numeric `mm/dd/yyyy` is read
  /// month first.
  MonthFirst,
}

impl DateFormat {
  pub fn parse(self, value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    match self {
      Self::Exact(fmt) => NaiveDate::parse_from_str(value, fmt).ok(),
      Self::Flexible => parse_flexible(value),
      Self::MonthFirst => NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .ok()
        .or_else(|| parse_flexible(value)),
    }
  }
}

/// Parse with the fallback chain. Also accepts an ISO timestamp, keeping only
/// its date part.
pub fn parse_flexible(value: &str) -> Option<NaiveDate> {
  let value = value.trim();
  if value.is_empty() {
    return None;
  }
  for fmt in FALLBACK_FORMATS {
    if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
      return Some(d);
    }
  }
  if let Ok(d) = NaiveDate::parse_from_str(&format!("1 {value}"), "%d %B %Y")
  {
    return Some(d);
  }
  // "2020-03-18 00:00:00" / "2020-03-18T00:00:00"
  if value.len() > 10
    && let Some(head) = value.get(..10)
    && let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d")
  {
    return Some(d);
  }
  None
}

/// The two per-registry date columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateField {
  Registration,
  Enrollment,
}

impl fmt::Display for DateField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Registration => f.write_str("Date_registration"),
      Self::Enrollment => f.write_str("Date_enrollement"),
    }
  }
}

/// Parse one of a trial's registry dates.
///
/// - Registration dates are mandatory; an empty value is
///   [`Error::MissingDate`].
/// - An empty enrollment date is `Ok(None)`.
/// - A non-empty value that does not parse is [`Error::UnparseableDate`],
///   whether or not the registry is known.
pub fn parse_trial_date(
  trial_id: &str,
  field: DateField,
  raw: Option<&str>,
) -> Result<Option<NaiveDate>> {
  let value = raw.map(str::trim).unwrap_or_default();
  if value.is_empty() {
    return match field {
      DateField::Registration => Err(Error::MissingDate {
        trial_id: trial_id.to_string(),
        field,
      }),
      DateField::Enrollment => Ok(None),
    };
  }

  let format = match (Registry::detect(trial_id), field) {
    (Some(r), DateField::Registration) => r.registration_format(),
    (Some(r), DateField::Enrollment) => r.enrollment_format(),
    (None, _) => DateFormat::Flexible,
  };

  format
    .parse(value)
    .map(Some)
    .ok_or_else(|| Error::UnparseableDate {
      trial_id: trial_id.to_string(),
      field,
      value: value.to_string(),
    })
}
