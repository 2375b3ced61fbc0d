//! Core types and pure logic for the handset price catalog.
//!
//! This crate is free of file-system and runtime dependencies.
//! Every other crate depends on it: the canonical smartphone record, the price
//! history and alert models, the string normalizer and the identity key all
//! live here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alert;
pub mod error;
pub mod history;
pub mod identity;
pub mod normalize;
pub mod provider;
pub mod smartphone;
pub mod store;

pub use alert::{
  AlertPreferences, AlertSet, NewAlert, PreferencesPatch, PriceAlert, normalize_email,
};
pub use error::{Error, Result};
pub use history::{PriceHistory, PriceHistoryEntry, PricePoint};
pub use identity::generate_id;
pub use provider::Provider;
pub use smartphone::{Smartphone, UpfrontPrice};
pub use store::{
  AlertRegistry, CatalogStore, Notifier, PriceChangeNotice, SaveReceipt,
};
