//! Error types for `handset-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown provider: {0:?}")]
  UnknownProvider(String),

  #[error("invalid smartphone {id:?}: {reason}")]
  InvalidSmartphone { id: String, reason: &'static str },

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
