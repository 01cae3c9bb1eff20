//! Error types for `ictrp-xml`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("xml error at byte {position}: {message}")]
  Xml { position: u64, message: String },

  #[error("document has no root element")]
  EmptyDocument,

  #[error("unexpected root element <{0}>, expected <Trials_downloaded_from_ICTRP>")]
  UnexpectedRoot(String),

  #[error("trial #{0} has no TrialID")]
  MissingTrialId(usize),

  #[error("svg write error: {0}")]
  Write(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
