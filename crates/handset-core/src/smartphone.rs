//! The canonical smartphone record and its validation gate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Provider, Result};

// ─── Price quote ─────────────────────────────────────────────────────────────

/// One provider's one-time device price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpfrontPrice {
  /// Whole euros.
  pub price:     u32,
  /// Free-text annotation, e.g. "Avec DataPhone 2,5 GB : €25/mois.".
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url:       Option<String>,
}

// ─── Smartphone ──────────────────────────────────────────────────────────────

/// The merged, cross-provider representation of one device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Smartphone {
  /// Identity key, see [`crate::generate_id`].
  pub id:             String,
  pub brand:          String,
  pub model:          String,
  /// Gigabytes.
  pub storage:        u32,
  /// Empty until some provider supplies an image; never replaced afterwards.
  #[serde(default)]
  pub image_url:      String,
  /// At most one quote per provider; keys iterate in priority order.
  #[serde(default)]
  pub upfront_prices: BTreeMap<Provider, UpfrontPrice>,
}

impl Smartphone {
  /// "Brand Model", as shown to users.
  pub fn display_name(&self) -> String { format!("{} {}", self.brand, self.model) }

  pub fn price_for(&self, provider: Provider) -> Option<u32> {
    self.upfront_prices.get(&provider).map(|q| q.price)
  }

  /// A copy carrying only `provider`'s quote.
  pub fn narrowed_to(&self, provider: Provider) -> Self {
    let upfront_prices = self
      .upfront_prices
      .get(&provider)
      .map(|q| BTreeMap::from([(provider, q.clone())]))
      .unwrap_or_default();
    Self {
      upfront_prices,
      ..self.clone()
    }
  }

  /// The gate every record passes before it may be persisted: an id, a brand,
  /// a model, a non-zero storage and at least one provider quote.
  pub fn validate(&self) -> Result<()> {
    let reason = if self.id.trim().is_empty() {
      "missing id"
    } else if self.brand.trim().is_empty() {
      "missing brand"
    } else if self.model.trim().is_empty() {
      "missing model"
    } else if self.storage == 0 {
      "missing storage"
    } else if self.upfront_prices.is_empty() {
      "no provider prices"
    } else {
      return Ok(());
    };
    Err(Error::InvalidSmartphone {
      id: self.id.clone(),
      reason,
    })
  }
}
