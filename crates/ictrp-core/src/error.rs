//! Error types for `ictrp-core`.

use thiserror::Error;

use crate::date::DateField;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{trial_id}: cannot parse {field} value {value:?}")]
  UnparseableDate {
    trial_id: String,
    field:    DateField,
    value:    String,
  },

  #[error("{trial_id}: missing {field}")]
  MissingDate { trial_id: String, field: DateField },

  #[error("unknown trial field: {0:?}")]
  UnknownField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
