//! Flat-file JSON backend for the handset catalog.
//!
//! Three documents live side by side: the catalog (an array of smartphones),
//! the price history (an array of per-pair series) and the alert registry
//! (`{"alerts": [...]}`). File access goes through [`tokio::fs`].

mod digest;
mod lock;
mod store;

pub mod error;

pub use digest::{catalog_digest, digest_bytes};
pub use error::{Error, Result};
pub use lock::RunLock;
pub use store::{ALERTS_FILE, CATALOG_FILE, HISTORY_FILE, JsonStore, StorePaths};
