//! Error types for the feed codec.

use handset_core::Provider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{provider} feed is not {expected}")]
  FeedShape {
    provider: Provider,
    expected: &'static str,
  },

  #[error("invalid {provider} mapping: {reason}")]
  InvalidMapping { provider: Provider, reason: String },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
