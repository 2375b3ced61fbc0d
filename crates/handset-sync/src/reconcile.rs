//! Reconciliation: per-provider extractions → one canonical catalog.
//!
//! Pipeline:
//!   extractions (any order)
//!     └─ fold each provider's items by identity key   → per-provider map
//!          └─ merge per-provider maps in priority order → global map
//!               └─ sort by (brand, model, storage)
//!                    └─ validate, drop invalid records
//!
//! Both merge steps apply the same [`MergePolicy`].

use std::{cmp::Ordering, collections::BTreeMap};

use handset_core::{Provider, Smartphone, UpfrontPrice, generate_id};
use handset_feeds::{ExtractedPhone, Extraction};
use tracing::{debug, warn};

// ─── Merge policy ────────────────────────────────────────────────────────────

/// How a field of an existing record reacts to an incoming observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
  /// The incoming value always replaces the current one.
  OverwriteAlways,
  /// The incoming value only fills an empty field.
  FirstWins,
  /// The incoming value replaces the current one only when it comes from a
  /// provider of strictly higher priority than the one that set it.
  PrimaryProviderWins,
}

/// The record fields a merge can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeField {
  Brand,
  Model,
  ImageUrl,
  /// The incoming provider's own slot in `upfrontPrices`. Other providers'
  /// slots are never touched.
  ProviderQuote,
}

/// The decision table applied when an observation meets an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
  pub brand:          MergeRule,
  pub model:          MergeRule,
  pub image_url:      MergeRule,
  pub provider_quote: MergeRule,
}

impl MergePolicy {
  /// Display strings come from the highest-priority provider, the first image
  /// supplied sticks, and each provider's latest quote replaces its previous
  /// one.
  pub const STANDARD: Self = Self {
    brand:          MergeRule::PrimaryProviderWins,
    model:          MergeRule::PrimaryProviderWins,
    image_url:      MergeRule::FirstWins,
    provider_quote: MergeRule::OverwriteAlways,
  };

  pub fn rule(&self, field: MergeField) -> MergeRule {
    match field {
      MergeField::Brand => self.brand,
      MergeField::Model => self.model,
      MergeField::ImageUrl => self.image_url,
      MergeField::ProviderQuote => self.provider_quote,
    }
  }
}

impl Default for MergePolicy {
  fn default() -> Self { Self::STANDARD }
}

// ─── Working record ──────────────────────────────────────────────────────────

/// A record under construction, remembering which provider set its display
/// strings. Records carried over from a previous catalog have no source, so
/// any fresh observation outranks them.
#[derive(Debug, Clone)]
struct Candidate {
  phone:  Smartphone,
  source: Option<Provider>,
}

impl Candidate {
  fn from_extracted(item: &ExtractedPhone) -> Self {
    let id = generate_id(&item.brand, &item.model, item.storage);
    Self {
      phone:  Smartphone {
        id,
        brand: item.brand.clone(),
        model: item.model.clone(),
        storage: item.storage,
        image_url: item.image_url.clone().unwrap_or_default(),
        upfront_prices: BTreeMap::from([(item.provider, UpfrontPrice {
          price:     item.price,
          condition: item.condition.clone(),
          url:       item.url.clone(),
        })]),
      },
      source: Some(item.provider),
    }
  }

  fn carried(phone: Smartphone) -> Self {
    Self {
      phone,
      source: None,
    }
  }

  /// Whether `incoming` may replace a value set by `self.source` under
  /// `rule`, given whether the current value is empty.
  fn accepts(&self, rule: MergeRule, incoming: Option<Provider>, current_empty: bool) -> bool {
    match rule {
      MergeRule::OverwriteAlways => true,
      MergeRule::FirstWins => current_empty,
      MergeRule::PrimaryProviderWins => {
        current_empty
          || match (incoming, self.source) {
            (Some(new), Some(old)) => new < old,
            (Some(_), None) => true,
            (None, _) => false,
          }
      }
    }
  }

  /// Fold `other`, an observation of the same identity key, into `self`.
  fn absorb(&mut self, other: Candidate, policy: &MergePolicy) {
    let Candidate { phone, source } = other;

    let rule = |field| policy.rule(field);

    let take_brand = self.accepts(rule(MergeField::Brand), source, self.phone.brand.is_empty());
    let take_model = self.accepts(rule(MergeField::Model), source, self.phone.model.is_empty());
    if take_brand && !phone.brand.is_empty() {
      self.phone.brand = phone.brand;
    }
    if take_model && !phone.model.is_empty() {
      self.phone.model = phone.model;
    }
    if (take_brand || take_model) && source.is_some_and(|s| self.source.is_none_or(|o| s < o)) {
      self.source = source;
    }

    if self.accepts(rule(MergeField::ImageUrl), source, self.phone.image_url.is_empty())
      && !phone.image_url.is_empty()
    {
      self.phone.image_url = phone.image_url;
    }

    for (provider, quote) in phone.upfront_prices {
      let present = self.phone.upfront_prices.contains_key(&provider);
      if self.accepts(rule(MergeField::ProviderQuote), source, !present) {
        self.phone.upfront_prices.insert(provider, quote);
      }
    }
  }
}

type CandidateMap = BTreeMap<String, Candidate>;

fn merge_into(map: &mut CandidateMap, incoming: Candidate, policy: &MergePolicy) {
  match map.get_mut(&incoming.phone.id) {
    Some(existing) => existing.absorb(incoming, policy),
    None => {
      map.insert(incoming.phone.id.clone(), incoming);
    }
  }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// The reconciled catalog and what was left out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
  /// Valid records, sorted by (brand, model, storage).
  pub catalog: Vec<Smartphone>,
  /// Ids of records that failed validation.
  pub dropped: Vec<String>,
}

/// Reconcile fresh extractions into a new catalog.
pub fn reconcile(extractions: &[Extraction]) -> Reconciled {
  reconcile_onto(Vec::new(), extractions, &MergePolicy::STANDARD)
}

/// Reconcile fresh extractions on top of `seed`, an existing catalog.
///
/// Seed records are updated in place, so quotes from providers absent in
/// this run survive. The output does not depend on the order of
/// `extractions`: providers are always merged in priority order.
pub fn reconcile_onto(
  seed: Vec<Smartphone>,
  extractions: &[Extraction],
  policy: &MergePolicy,
) -> Reconciled {
  let mut global: CandidateMap = BTreeMap::new();
  for phone in seed {
    merge_into(&mut global, Candidate::carried(phone), policy);
  }

  for provider in Provider::in_priority_order() {
    let mut per_provider: CandidateMap = BTreeMap::new();
    for item in extractions
      .iter()
      .filter(|e| e.provider == provider)
      .flat_map(|e| &e.items)
    {
      merge_into(&mut per_provider, Candidate::from_extracted(item), policy);
    }
    debug!(%provider, records = per_provider.len(), "provider folded");

    for candidate in per_provider.into_values() {
      merge_into(&mut global, candidate, policy);
    }
  }

  let mut catalog: Vec<Smartphone> = global.into_values().map(|c| c.phone).collect();
  catalog.sort_by(catalog_order);

  let mut dropped = Vec::new();
  catalog.retain(|phone| match phone.validate() {
    Ok(()) => true,
    Err(e) => {
      warn!(id = %phone.id, error = %e, record = ?phone, "dropping invalid record");
      dropped.push(phone.id.clone());
      false
    }
  });

  Reconciled { catalog, dropped }
}

/// Brand, then model, case-insensitively; then storage. Exact spelling and
/// the id break remaining ties so the order is total.
fn catalog_order(a: &Smartphone, b: &Smartphone) -> Ordering {
  collate(&a.brand, &b.brand)
    .then_with(|| collate(&a.model, &b.model))
    .then_with(|| a.storage.cmp(&b.storage))
    .then_with(|| a.id.cmp(&b.id))
}

fn collate(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(provider: Provider, brand: &str, model: &str, storage: u32, price: u32) -> ExtractedPhone {
    ExtractedPhone {
      provider,
      brand: brand.into(),
      model: model.into(),
      storage,
      price,
      condition: None,
      url: None,
      image_url: None,
    }
  }

  fn extraction(provider: Provider, items: Vec<ExtractedPhone>) -> Extraction {
    Extraction {
      total: items.len(),
      items,
      ..Extraction::empty(provider)
    }
  }

  #[test]
  fn two_providers_one_record() {
    let out = reconcile(&[
      extraction(Provider::Proximus, vec![item(Provider::Proximus, "Samsung", "Galaxy S24", 256, 900)]),
      extraction(Provider::Voo, vec![item(Provider::Voo, "samsung", "galaxy s24", 256, 950)]),
    ]);
    assert_eq!(out.catalog.len(), 1);
    let phone = &out.catalog[0];
    assert_eq!(phone.id, "samsung-galaxy-s24-256");
    assert_eq!(phone.brand, "Samsung");
    assert_eq!(phone.model, "Galaxy S24");
    assert_eq!(phone.price_for(Provider::Proximus), Some(900));
    assert_eq!(phone.price_for(Provider::Voo), Some(950));
  }

  #[test]
  fn primary_provider_wins_regardless_of_input_order() {
    let voo = extraction(Provider::Voo, vec![item(Provider::Voo, "samsung", "galaxy s24", 256, 950)]);
    let prx = extraction(Provider::Proximus, vec![item(
      Provider::Proximus,
      "Samsung",
      "Galaxy S24",
      256,
      900,
    )]);
    let a = reconcile(&[voo.clone(), prx.clone()]);
    let b = reconcile(&[prx, voo]);
    assert_eq!(a, b);
    assert_eq!(a.catalog[0].model, "Galaxy S24");
  }

  #[test]
  fn within_a_provider_last_quote_and_first_image_win() {
    let mut first = item(Provider::Orange, "Apple", "iPhone 15", 128, 800);
    first.image_url = Some("https://img/first.png".into());
    let mut second = item(Provider::Orange, "Apple", "iPhone 15 Black", 128, 780);
    second.image_url = Some("https://img/second.png".into());

    let out = reconcile(&[extraction(Provider::Orange, vec![first, second])]);
    assert_eq!(out.catalog.len(), 1);
    assert_eq!(out.catalog[0].price_for(Provider::Orange), Some(780));
    assert_eq!(out.catalog[0].image_url, "https://img/first.png");
    assert_eq!(out.catalog[0].model, "iPhone 15");
  }

  #[test]
  fn later_provider_fills_missing_image_only() {
    let prx = item(Provider::Proximus, "Google", "Pixel 8", 128, 599);
    let mut voo = item(Provider::Voo, "Google", "Pixel 8", 128, 579);
    voo.image_url = Some("https://img/voo.png".into());

    let out = reconcile(&[
      extraction(Provider::Proximus, vec![prx]),
      extraction(Provider::Voo, vec![voo]),
    ]);
    assert_eq!(out.catalog[0].image_url, "https://img/voo.png");
  }

  #[test]
  fn seed_keeps_absent_providers() {
    let seeded = reconcile(&[
      extraction(Provider::Proximus, vec![item(Provider::Proximus, "Google", "Pixel 8", 128, 599)]),
      extraction(Provider::Orange, vec![item(Provider::Orange, "Google", "Pixel 8", 128, 620)]),
    ]);

    let out = reconcile_onto(
      seeded.catalog,
      &[extraction(Provider::Proximus, vec![item(Provider::Proximus, "Google", "Pixel 8", 128, 549)])],
      &MergePolicy::STANDARD,
    );
    let phone = &out.catalog[0];
    assert_eq!(phone.price_for(Provider::Proximus), Some(549));
    assert_eq!(phone.price_for(Provider::Orange), Some(620));
  }

  #[test]
  fn sorted_by_brand_model_storage() {
    let out = reconcile(&[extraction(Provider::Voo, vec![
      item(Provider::Voo, "Samsung", "Galaxy S24", 512, 1),
      item(Provider::Voo, "apple", "iPhone 15", 128, 1),
      item(Provider::Voo, "Samsung", "Galaxy S24", 256, 1),
      item(Provider::Voo, "Google", "Pixel 8", 128, 1),
    ])]);
    let order: Vec<(&str, u32)> = out
      .catalog
      .iter()
      .map(|p| (p.brand.as_str(), p.storage))
      .collect();
    assert_eq!(order, vec![
      ("apple", 128),
      ("Google", 128),
      ("Samsung", 256),
      ("Samsung", 512)
    ]);
  }

  #[test]
  fn invalid_seed_records_are_dropped() {
    let mut bad = Smartphone {
      id:             "x-y-0".into(),
      brand:          "X".into(),
      model:          "Y".into(),
      storage:        0,
      image_url:      String::new(),
      upfront_prices: BTreeMap::new(),
    };
    bad.upfront_prices.insert(Provider::Voo, UpfrontPrice {
      price:     1,
      condition: None,
      url:       None,
    });
    let out = reconcile_onto(vec![bad], &[], &MergePolicy::STANDARD);
    assert!(out.catalog.is_empty());
    assert_eq!(out.dropped, vec!["x-y-0".to_string()]);
  }

  #[test]
  fn every_output_record_is_complete() {
    let out = reconcile(&[
      extraction(Provider::Proximus, vec![item(Provider::Proximus, "Fairphone", "5", 256, 0)]),
      extraction(Provider::Orange, vec![item(Provider::Orange, "Nokia", "G42", 128, 199)]),
    ]);
    for phone in &out.catalog {
      assert!(!phone.brand.is_empty() && !phone.model.is_empty());
      assert!(phone.storage > 0);
      assert!(!phone.upfront_prices.is_empty());
    }
    assert_eq!(out.catalog.len(), 2);
  }

  #[test]
  fn policy_table_lookup() {
    let p = MergePolicy::default();
    assert_eq!(p.rule(MergeField::Brand), MergeRule::PrimaryProviderWins);
    assert_eq!(p.rule(MergeField::ImageUrl), MergeRule::FirstWins);
    assert_eq!(p.rule(MergeField::ProviderQuote), MergeRule::OverwriteAlways);
  }

  #[test]
  fn custom_policy_changes_the_merge() {
    let mut first = item(Provider::Orange, "Apple", "iPhone 15", 128, 800);
    first.image_url = Some("https://img/first.png".into());
    let mut second = item(Provider::Orange, "Apple", "iPhone 15", 128, 780);
    second.image_url = Some("https://img/second.png".into());
    let feeds = [extraction(Provider::Orange, vec![first, second])];

    let policy = MergePolicy {
      image_url: MergeRule::OverwriteAlways,
      provider_quote: MergeRule::FirstWins,
      ..MergePolicy::STANDARD
    };
    let out = reconcile_onto(Vec::new(), &feeds, &policy);
    assert_eq!(out.catalog[0].image_url, "https://img/second.png");
    assert_eq!(out.catalog[0].price_for(Provider::Orange), Some(800));

    let out = reconcile_onto(Vec::new(), &feeds, &MergePolicy::STANDARD);
    assert_eq!(out.catalog[0].image_url, "https://img/first.png");
    assert_eq!(out.catalog[0].price_for(Provider::Orange), Some(780));
  }
}
