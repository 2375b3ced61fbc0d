//! Persistence and notification seams.
//!
//! These traits are implemented by `handset-store-json` (files) and by the
//! notifiers in `handset-sync`. The reconciliation and tracking logic depends
//! only on these abstractions, never on a concrete backend.

use std::future::Future;

use serde::Serialize;

use crate::{Provider, Smartphone, alert::PriceAlert, history::PriceHistory};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Outcome of [`CatalogStore::save_catalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
  /// Hex SHA-256 of the bytes written.
  pub digest:  String,
  /// False when the new content is byte-identical to the previous one.
  pub changed: bool,
}

/// Storage of the canonical catalog and of the price history log.
///
/// Loads of a store that has never been written return empty values. Saves
/// replace the whole document.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn load_catalog(
    &self,
  ) -> impl Future<Output = Result<Vec<Smartphone>, Self::Error>> + Send + '_;

  fn save_catalog<'a>(
    &'a self,
    catalog: &'a [Smartphone],
  ) -> impl Future<Output = Result<SaveReceipt, Self::Error>> + Send + 'a;

  fn load_history(
    &self,
  ) -> impl Future<Output = Result<PriceHistory, Self::Error>> + Send + '_;

  fn save_history<'a>(
    &'a self,
    history: &'a PriceHistory,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

/// Read side of the alert registry, as consumed by the price tracker.
pub trait AlertRegistry: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_alerts(
    &self,
  ) -> impl Future<Output = Result<Vec<PriceAlert>, Self::Error>> + Send + '_;
}

// ─── Notification ────────────────────────────────────────────────────────────

/// Everything an outbound notification needs about one price change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeNotice {
  pub email:      String,
  pub smartphone: Smartphone,
  pub provider:   Provider,
  pub old_price:  u32,
  pub new_price:  u32,
  pub alert:      PriceAlert,
}

impl PriceChangeNotice {
  pub fn is_decrease(&self) -> bool { self.new_price < self.old_price }
}

/// Delivery of price-change notifications. One call per qualifying alert.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send_price_change<'a>(
    &'a self,
    notice: &'a PriceChangeNotice,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
