//! Declarative field mapping: which provider fields feed which canonical
//! field, and through which transforms.
//!
//! A mapping document looks like:
//!
//! ```json
//! {
//!   "voo": {
//!     "brand": [
//!       { "field": "brandName", "transform": ["normalize_brand"] },
//!       { "field": "name", "transform": ["first_word", "normalize_brand"] }
//!     ],
//!     "model": [{ "field": "name", "transform": ["clean_model"] }],
//!     "storage": [{ "field": "storage", "transform": ["extract_storage"] }],
//!     "price": [{ "field": "basePrice", "transform": ["price"] }]
//!   }
//! }
//! ```
//!
//! Each canonical field lists its sources in precedence order; the first
//! source present on an item wins. Providers missing from the document keep
//! the built-in mapping.

use handset_core::Provider;
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  item::{OrangeField, ProximusField, VooField},
  transform::{TEMPLATE_PLACEHOLDER, Transform},
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// One source for a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping<F> {
  pub field:     F,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub transform: Vec<Transform>,
}

impl<F> FieldMapping<F> {
  pub fn new(field: F, transform: impl IntoIterator<Item = Transform>) -> Self {
    Self {
      field,
      transform: transform.into_iter().collect(),
    }
  }

  pub fn raw(field: F) -> Self {
    Self {
      field,
      transform: Vec::new(),
    }
  }
}

/// Sources for one canonical field, in precedence order.
pub type FieldRule<F> = Vec<FieldMapping<F>>;

/// How one provider's items map onto the canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "F: Deserialize<'de>"))]
pub struct ProviderMapping<F> {
  pub brand:     FieldRule<F>,
  pub model:     FieldRule<F>,
  pub storage:   FieldRule<F>,
  pub price:     FieldRule<F>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub url:       FieldRule<F>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub image_url: FieldRule<F>,
}

impl<F> ProviderMapping<F> {
  fn validate(&self, provider: Provider) -> Result<()> {
    let invalid = |reason: String| Error::InvalidMapping { provider, reason };

    for (name, rule) in [
      ("brand", &self.brand),
      ("model", &self.model),
      ("storage", &self.storage),
      ("price", &self.price),
    ] {
      if rule.is_empty() {
        return Err(invalid(format!("`{name}` has no source field")));
      }
    }

    let rules = [
      &self.brand,
      &self.model,
      &self.storage,
      &self.price,
      &self.url,
      &self.image_url,
    ];
    for t in rules.iter().flat_map(|r| r.iter()).flat_map(|m| &m.transform) {
      if let Transform::UrlTemplate { template } = t
        && !template.contains(TEMPLATE_PLACEHOLDER)
      {
        return Err(invalid(format!(
          "url template {template:?} lacks the {TEMPLATE_PLACEHOLDER} placeholder"
        )));
      }
    }
    Ok(())
  }
}

/// The mapping for every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMappings {
  #[serde(default = "default_proximus")]
  pub proximus: ProviderMapping<ProximusField>,
  #[serde(default = "default_voo")]
  pub voo:      ProviderMapping<VooField>,
  #[serde(default = "default_orange")]
  pub orange:   ProviderMapping<OrangeField>,
}

impl Default for FeedMappings {
  fn default() -> Self {
    Self {
      proximus: default_proximus(),
      voo:      default_voo(),
      orange:   default_orange(),
    }
  }
}

impl FeedMappings {
  /// Parse and validate a mapping document.
  pub fn from_json(text: &str) -> Result<Self> {
    let mappings: Self = serde_json::from_str(text)?;
    mappings.validate()?;
    Ok(mappings)
  }

  pub fn validate(&self) -> Result<()> {
    self.proximus.validate(Provider::Proximus)?;
    self.voo.validate(Provider::Voo)?;
    self.orange.validate(Provider::Orange)
  }

  pub fn to_json_pretty(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }
}

// ─── Built-in mapping ────────────────────────────────────────────────────────

pub const PROXIMUS_URL_TEMPLATE: &str = "https://www.proximus.be/fr/id_cr_{value}";
pub const VOO_URL_TEMPLATE: &str = "https://www.voo.be/fr/mobile/smartphones/{value}";

fn url_template(template: &str) -> Transform {
  Transform::UrlTemplate {
    template: template.to_string(),
  }
}

fn default_proximus() -> ProviderMapping<ProximusField> {
  use ProximusField as F;
  use Transform as T;
  ProviderMapping {
    brand:     vec![FieldMapping::new(F::Brand, [T::NormalizeBrand])],
    model:     vec![
      FieldMapping::new(F::Name, [T::CleanModel]),
      FieldMapping::new(F::Model, [T::CleanModel]),
      FieldMapping::new(F::Title, [T::CleanModel]),
    ],
    storage:   vec![
      FieldMapping::new(F::Storage, [T::ExtractStorage]),
      FieldMapping::new(F::Capacity, [T::ExtractStorage]),
      FieldMapping::new(F::Name, [T::ExtractStorage]),
      FieldMapping::new(F::Title, [T::ExtractStorage]),
    ],
    price:     vec![
      FieldMapping::new(F::PriceJo, [T::Price]),
      FieldMapping::new(F::Price, [T::Price]),
    ],
    url:       vec![
      FieldMapping::new(F::ProductCode, [url_template(PROXIMUS_URL_TEMPLATE)]),
      FieldMapping::raw(F::Link),
    ],
    image_url: vec![FieldMapping::raw(F::ImageLink)],
  }
}

fn default_voo() -> ProviderMapping<VooField> {
  use Transform as T;
  use VooField as F;
  ProviderMapping {
    brand:     vec![
      FieldMapping::new(F::BrandName, [T::NormalizeBrand]),
      FieldMapping::new(F::Name, [T::FirstWord, T::NormalizeBrand]),
    ],
    model:     vec![FieldMapping::new(F::Name, [T::CleanModel])],
    storage:   vec![FieldMapping::new(F::Storage, [
      T::RemoveGoSuffix,
      T::ExtractStorage,
    ])],
    price:     vec![
      FieldMapping::new(F::BasePrice, [T::Price]),
      FieldMapping::new(F::Price, [T::Price]),
      FieldMapping::new(F::PriceAlteration, [T::Price]),
    ],
    url:       vec![FieldMapping::new(F::BaseProductCode, [url_template(
      VOO_URL_TEMPLATE,
    )])],
    image_url: vec![FieldMapping::raw(F::Image)],
  }
}

fn default_orange() -> ProviderMapping<OrangeField> {
  use OrangeField as F;
  use Transform as T;
  ProviderMapping {
    brand:     vec![FieldMapping::new(F::Brand, [T::NormalizeBrand])],
    model:     vec![
      FieldMapping::new(F::Name, [T::CleanModel]),
      FieldMapping::new(F::Model, [T::CleanModel]),
      FieldMapping::new(F::Description, [T::CleanModel]),
    ],
    storage:   vec![
      FieldMapping::new(F::Storage, [T::ExtractStorage]),
      FieldMapping::new(F::Memory, [T::ExtractStorage]),
      FieldMapping::new(F::HardDisk, [T::ExtractStorage]),
      FieldMapping::new(F::Name, [T::ExtractStorage]),
      FieldMapping::new(F::Description, [T::ExtractStorage]),
    ],
    price:     vec![
      FieldMapping::new(F::PriceRecurringInitial, [T::Price]),
      FieldMapping::new(F::Price, [T::Price]),
    ],
    url:       vec![FieldMapping::raw(F::ProductUrl), FieldMapping::raw(F::Href)],
    image_url: vec![FieldMapping::raw(F::Image)],
  }
}
