//! Error type for `ictrp-tables`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error on {}: {source}", .path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("write error: {0}")]
  Write(#[from] std::io::Error),

  #[error("{table}: missing column {column:?}")]
  MissingColumn {
    table:  &'static str,
    column: &'static str,
  },

  /// A curated table maps one key to two different values.
  #[error("{table}: {key:?} maps to both {first:?} and {second:?}")]
  ConflictingEntry {
    table:  &'static str,
    key:    String,
    first:  String,
    second: String,
  },

  #[error("{table}: cannot parse date {value:?} for {key:?}")]
  DateParse {
    table: &'static str,
    key:   String,
    value: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
