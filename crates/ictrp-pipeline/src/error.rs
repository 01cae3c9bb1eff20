//! Error type for `ictrp-pipeline`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ictrp_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
