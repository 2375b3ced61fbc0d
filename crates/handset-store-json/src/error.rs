//! Error type for `handset-store-json`.

use std::path::PathBuf;

use handset_core::Provider;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] handset_core::Error),

  #[error("i/o error on {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A document exists but is not valid JSON for its type.
  #[error("corrupt document {}: {source}", path.display())]
  Corrupt {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("json encoding error: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("unknown smartphone: {0}")]
  UnknownSmartphone(String),

  #[error("an alert already exists for {email} on {smartphone_id} at {provider}")]
  DuplicateAlert {
    email:         String,
    smartphone_id: String,
    provider:      Provider,
  },

  #[error("alert not found: {0}")]
  AlertNotFound(Uuid),

  #[error("another run holds {} ({holder})", path.display())]
  Locked { path: PathBuf, holder: String },
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
