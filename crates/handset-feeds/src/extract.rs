//! Feed extraction: raw provider document → extracted phones.
//!
//! Pipeline:
//!   feed root
//!     └─ ProviderFeed::items()      → &[Value]
//!          └─ deserialize item      → typed item (failure: logged, counted)
//!               └─ map_item()       → ExtractedPhone (incomplete: skipped)

use handset_core::Provider;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  item::{OrangeItem, ProviderFeed, ProximusItem, VooItem},
  mapping::{FeedMappings, FieldMapping, ProviderMapping},
  transform::{FieldValue, apply_all},
};

// ─── Output types ────────────────────────────────────────────────────────────

/// One provider item reduced to the fields reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPhone {
  pub provider:  Provider,
  pub brand:     String,
  pub model:     String,
  /// Gigabytes, never zero.
  pub storage:   u32,
  /// Whole euros; `0` when no price source is present.
  pub price:     u32,
  pub condition: Option<String>,
  pub url:       Option<String>,
  pub image_url: Option<String>,
}

/// The result of reading one provider feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
  pub provider:   Provider,
  /// Items found under the feed root.
  pub total:      usize,
  pub items:      Vec<ExtractedPhone>,
  /// Items lacking brand, model or storage.
  pub skipped:    usize,
  /// Items that could not be read at all.
  pub failed:     usize,
  /// Set when the whole feed was unusable and treated as empty.
  pub feed_error: Option<String>,
}

impl Extraction {
  pub fn empty(provider: Provider) -> Self {
    Self {
      provider,
      total: 0,
      items: Vec::new(),
      skipped: 0,
      failed: 0,
      feed_error: None,
    }
  }

  /// An empty extraction standing in for a feed that could not be used.
  pub fn unusable(provider: Provider, reason: impl Into<String>) -> Self {
    Self {
      feed_error: Some(reason.into()),
      ..Self::empty(provider)
    }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Extract every usable item from `root`, a parsed `provider` feed.
///
/// Never fails: a malformed feed is logged and yields an empty extraction;
/// malformed or incomplete items are logged and left out.
pub fn extract(provider: Provider, root: &Value, mappings: &FeedMappings) -> Extraction {
  match provider {
    Provider::Proximus => extract_feed::<ProximusItem>(root, &mappings.proximus),
    Provider::Voo => extract_feed::<VooItem>(root, &mappings.voo),
    Provider::Orange => extract_feed::<OrangeItem>(root, &mappings.orange),
  }
}

/// [`extract`] for a statically known provider shape.
pub fn extract_feed<P: ProviderFeed>(
  root: &Value,
  mapping: &ProviderMapping<P::Field>,
) -> Extraction {
  let provider = P::PROVIDER;
  let raw_items = match P::items(root) {
    Ok(items) => items,
    Err(e) => {
      warn!(%provider, error = %e, "unusable feed; treating provider as empty");
      return Extraction::unusable(provider, e.to_string());
    }
  };

  let mut out = Extraction {
    total: raw_items.len(),
    ..Extraction::empty(provider)
  };

  for raw in raw_items {
    let item: P = match serde_json::from_value(raw.clone()) {
      Ok(item) => item,
      Err(e) => {
        warn!(%provider, error = %e, raw = %raw, "unreadable item; skipping");
        out.failed += 1;
        continue;
      }
    };

    match map_item(&item, mapping) {
      Some(phone) => {
        debug!(
          %provider,
          brand = %phone.brand,
          model = %phone.model,
          storage = phone.storage,
          price = phone.price,
          "extracted item"
        );
        out.items.push(phone);
      }
      None => {
        warn!(%provider, raw = %raw, "item lacks brand, model or storage; skipping");
        out.skipped += 1;
      }
    }
  }

  out
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

fn resolve<P: ProviderFeed>(item: &P, rule: &[FieldMapping<P::Field>]) -> Option<FieldValue> {
  rule
    .iter()
    .find_map(|m| item.field(m.field).map(|v| apply_all(&m.transform, v)))
}

fn resolve_text<P: ProviderFeed>(item: &P, rule: &[FieldMapping<P::Field>]) -> Option<String> {
  resolve(item, rule)
    .map(|v| v.into_text().trim().to_string())
    .filter(|s| !s.is_empty())
}

fn map_item<P: ProviderFeed>(
  item: &P,
  mapping: &ProviderMapping<P::Field>,
) -> Option<ExtractedPhone> {
  let brand = resolve_text(item, &mapping.brand)?;
  let model = resolve_text(item, &mapping.model)?;
  let storage = resolve(item, &mapping.storage)
    .map(|v| v.as_storage())
    .filter(|gb| *gb > 0)?;
  let price = resolve(item, &mapping.price).map_or(0, |v| v.as_price());

  Some(ExtractedPhone {
    provider: P::PROVIDER,
    brand,
    model,
    storage,
    price,
    condition: item.condition(),
    url: resolve_text(item, &mapping.url),
    image_url: resolve_text(item, &mapping.image_url),
  })
}
