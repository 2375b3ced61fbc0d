//! Typed provider items and their feed roots.
//!
//! Each provider gets its own item struct, the set of fields a mapping may
//! reference, the path to its item array, and its condition template.
//! Fields are tolerant scalars: feeds mix numbers and strings freely, and
//! some wrap a single value in an array.

use std::fmt::Debug;

use handset_core::Provider;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  error::{Error, Result},
  transform::FieldValue,
};

// ─── Scalars ─────────────────────────────────────────────────────────────────

/// A raw field value as found in a feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Number(f64),
  Text(String),
  /// Only the first element is ever read.
  List(Vec<Scalar>),
}

impl Scalar {
  pub fn value(&self) -> Option<FieldValue> {
    match self {
      Self::Number(n) => Some(FieldValue::Number(*n)),
      Self::Text(s) => Some(FieldValue::Text(s.clone())),
      Self::List(items) => items.first().and_then(Scalar::value),
    }
  }
}

fn read(field: &Option<Scalar>) -> Option<FieldValue> {
  field.as_ref().and_then(Scalar::value).filter(FieldValue::is_present)
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A provider feed shape.
pub trait ProviderFeed: DeserializeOwned + Debug {
  /// Names a mapping may use to reference this provider's fields.
  type Field: Copy + Debug + Eq + Serialize + DeserializeOwned;

  const PROVIDER: Provider;

  /// The item array inside a feed document.
  fn items(root: &Value) -> Result<&[Value]>;

  /// A present (non-blank, non-zero) field value.
  fn field(&self, field: Self::Field) -> Option<FieldValue>;

  /// The provider's human-readable offer condition, if the item carries one.
  fn condition(&self) -> Option<String>;
}

fn wrong_shape(provider: Provider, expected: &'static str) -> Error {
  Error::FeedShape { provider, expected }
}

/// Render a data-option condition when both the option and its price are
/// present.
fn data_option_condition(
  data_option: &Option<Scalar>,
  option_price: &Option<Scalar>,
  render: impl FnOnce(&FieldValue, &FieldValue) -> String,
) -> Option<String> {
  Some(render(&read(data_option)?, &read(option_price)?))
}

// ─── Proximus ────────────────────────────────────────────────────────────────

/// Proximus: the document root is the item array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProximusItem {
  pub brand:          Option<Scalar>,
  pub name:           Option<Scalar>,
  pub model:          Option<Scalar>,
  /// Full listing title, e.g. `"Samsung Galaxy S24 256GB"`.
  pub title:          Option<Scalar>,
  pub storage:        Option<Scalar>,
  pub capacity:       Option<Scalar>,
  pub price_jo:       Option<Scalar>,
  pub price:          Option<Scalar>,
  pub image_link:     Option<Scalar>,
  #[serde(rename = "productCode")]
  pub product_code:   Option<Scalar>,
  pub link:           Option<Scalar>,
  #[serde(rename = "dataOption")]
  pub data_option:    Option<Scalar>,
  #[serde(rename = "optionPrice")]
  pub option_price:   Option<Scalar>,
  pub info_dp:        Option<Scalar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProximusField {
  #[serde(rename = "brand")]
  Brand,
  #[serde(rename = "name")]
  Name,
  #[serde(rename = "model")]
  Model,
  #[serde(rename = "title")]
  Title,
  #[serde(rename = "storage")]
  Storage,
  #[serde(rename = "capacity")]
  Capacity,
  #[serde(rename = "price_jo")]
  PriceJo,
  #[serde(rename = "price")]
  Price,
  #[serde(rename = "image_link")]
  ImageLink,
  #[serde(rename = "productCode")]
  ProductCode,
  #[serde(rename = "link")]
  Link,
}

impl ProviderFeed for ProximusItem {
  type Field = ProximusField;

  const PROVIDER: Provider = Provider::Proximus;

  fn items(root: &Value) -> Result<&[Value]> {
    root
      .as_array()
      .map(Vec::as_slice)
      .ok_or_else(|| wrong_shape(Self::PROVIDER, "a top-level array"))
  }

  fn field(&self, field: ProximusField) -> Option<FieldValue> {
    read(match field {
      ProximusField::Brand => &self.brand,
      ProximusField::Name => &self.name,
      ProximusField::Model => &self.model,
      ProximusField::Title => &self.title,
      ProximusField::Storage => &self.storage,
      ProximusField::Capacity => &self.capacity,
      ProximusField::PriceJo => &self.price_jo,
      ProximusField::Price => &self.price,
      ProximusField::ImageLink => &self.image_link,
      ProximusField::ProductCode => &self.product_code,
      ProximusField::Link => &self.link,
    })
  }

  fn condition(&self) -> Option<String> {
    data_option_condition(&self.data_option, &self.option_price, |d, p| {
      format!("Avec {d} : €{p}/mois.")
    })
    .or_else(|| read(&self.info_dp).map(FieldValue::into_text))
  }
}

// ─── VOO ─────────────────────────────────────────────────────────────────────

/// VOO: items live under the root's `smartphones` property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VooItem {
  #[serde(rename = "brandName")]
  pub brand_name:        Option<Scalar>,
  pub name:              Option<Scalar>,
  /// Usually a one-element array such as `["128 Go"]`.
  pub storage:           Option<Scalar>,
  #[serde(rename = "basePrice")]
  pub base_price:        Option<Scalar>,
  pub price:             Option<Scalar>,
  #[serde(rename = "priceAlteration")]
  pub price_alteration:  Option<Scalar>,
  #[serde(rename = "baseProductCode")]
  pub base_product_code: Option<Scalar>,
  /// Variant code, distinct per storage size.
  pub code:              Option<Scalar>,
  pub image:             Option<Scalar>,
  #[serde(rename = "dataOption")]
  pub data_option:       Option<Scalar>,
  #[serde(rename = "optionPrice")]
  pub option_price:      Option<Scalar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VooField {
  #[serde(rename = "brandName")]
  BrandName,
  #[serde(rename = "name")]
  Name,
  #[serde(rename = "storage")]
  Storage,
  #[serde(rename = "basePrice")]
  BasePrice,
  #[serde(rename = "price")]
  Price,
  #[serde(rename = "priceAlteration")]
  PriceAlteration,
  #[serde(rename = "baseProductCode")]
  BaseProductCode,
  #[serde(rename = "code")]
  Code,
  #[serde(rename = "image")]
  Image,
}

impl ProviderFeed for VooItem {
  type Field = VooField;

  const PROVIDER: Provider = Provider::Voo;

  fn items(root: &Value) -> Result<&[Value]> {
    root
      .get("smartphones")
      .and_then(Value::as_array)
      .map(Vec::as_slice)
      .ok_or_else(|| wrong_shape(Self::PROVIDER, "an object with a `smartphones` array"))
  }

  fn field(&self, field: VooField) -> Option<FieldValue> {
    read(match field {
      VooField::BrandName => &self.brand_name,
      VooField::Name => &self.name,
      VooField::Storage => &self.storage,
      VooField::BasePrice => &self.base_price,
      VooField::Price => &self.price,
      VooField::PriceAlteration => &self.price_alteration,
      VooField::BaseProductCode => &self.base_product_code,
      VooField::Code => &self.code,
      VooField::Image => &self.image,
    })
  }

  fn condition(&self) -> Option<String> {
    data_option_condition(&self.data_option, &self.option_price, |d, p| {
      format!("Avec {d} pour {p}€/mois")
    })
  }
}

// ─── Orange ──────────────────────────────────────────────────────────────────

/// Orange: a search-index response; items live under `results[0].hits`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrangeItem {
  pub brand:                   Option<Scalar>,
  pub name:                    Option<Scalar>,
  pub model:                   Option<Scalar>,
  pub description:             Option<Scalar>,
  /// Hyphenated `brand-model` key, e.g. `"apple-iphone-15-128gb"`.
  #[serde(rename = "configurableSku")]
  pub configurable_sku:        Option<Scalar>,
  pub storage:                 Option<Scalar>,
  pub memory:                  Option<Scalar>,
  /// Storage in gigabytes, as a number.
  #[serde(rename = "hardDisk")]
  pub hard_disk:               Option<Scalar>,
  #[serde(rename = "priceRecurringInitial")]
  pub price_recurring_initial: Option<Scalar>,
  pub price:                   Option<Scalar>,
  #[serde(rename = "priceRecurringQuota")]
  pub price_recurring_quota:   Option<Scalar>,
  #[serde(rename = "productUrl")]
  pub product_url:             Option<Scalar>,
  pub href:                    Option<Scalar>,
  pub image:                   Option<Scalar>,
  #[serde(rename = "dataOption")]
  pub data_option:             Option<Scalar>,
  #[serde(rename = "optionPrice")]
  pub option_price:            Option<Scalar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrangeField {
  #[serde(rename = "brand")]
  Brand,
  #[serde(rename = "name")]
  Name,
  #[serde(rename = "model")]
  Model,
  #[serde(rename = "description")]
  Description,
  #[serde(rename = "configurableSku")]
  ConfigurableSku,
  #[serde(rename = "storage")]
  Storage,
  #[serde(rename = "memory")]
  Memory,
  #[serde(rename = "hardDisk")]
  HardDisk,
  #[serde(rename = "priceRecurringInitial")]
  PriceRecurringInitial,
  #[serde(rename = "price")]
  Price,
  #[serde(rename = "productUrl")]
  ProductUrl,
  #[serde(rename = "href")]
  Href,
  #[serde(rename = "image")]
  Image,
}

impl ProviderFeed for OrangeItem {
  type Field = OrangeField;

  const PROVIDER: Provider = Provider::Orange;

  /// Any missing level yields an empty slice: an empty search result is a
  /// normal response, not a malformed one.
  fn items(root: &Value) -> Result<&[Value]> {
    Ok(
      root
        .get("results")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("hits"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default(),
    )
  }

  fn field(&self, field: OrangeField) -> Option<FieldValue> {
    read(match field {
      OrangeField::Brand => &self.brand,
      OrangeField::Name => &self.name,
      OrangeField::Model => &self.model,
      OrangeField::Description => &self.description,
      OrangeField::ConfigurableSku => &self.configurable_sku,
      OrangeField::Storage => &self.storage,
      OrangeField::Memory => &self.memory,
      OrangeField::HardDisk => &self.hard_disk,
      OrangeField::PriceRecurringInitial => &self.price_recurring_initial,
      OrangeField::Price => &self.price,
      OrangeField::ProductUrl => &self.product_url,
      OrangeField::Href => &self.href,
      OrangeField::Image => &self.image,
    })
  }

  fn condition(&self) -> Option<String> {
    data_option_condition(&self.data_option, &self.option_price, |d, p| {
      format!("Avec {d} pour {p}€/mois")
    })
    .or_else(|| {
      read(&self.price_recurring_quota).map(|q| format!("Avec Option Data à {q}€/mois"))
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn scalars_accept_numbers_strings_and_lists() {
    let item: VooItem = serde_json::from_value(json!({
      "name": "Galaxy S24",
      "storage": ["256 Go", "512 Go"],
      "basePrice": 949.99,
    }))
    .unwrap();
    assert_eq!(
      item.field(VooField::Storage),
      Some(FieldValue::Text("256 Go".into()))
    );
    assert_eq!(item.field(VooField::BasePrice), Some(FieldValue::Number(949.99)));
    assert_eq!(item.field(VooField::Image), None);
  }

  #[test]
  fn blank_fields_are_absent() {
    let item: ProximusItem =
      serde_json::from_value(json!({ "price_jo": 0, "price": "", "brand": " " })).unwrap();
    assert_eq!(item.field(ProximusField::PriceJo), None);
    assert_eq!(item.field(ProximusField::Price), None);
    assert_eq!(item.field(ProximusField::Brand), None);
  }

  #[test]
  fn non_scalar_field_fails_the_item() {
    let res: Result<ProximusItem, _> = serde_json::from_value(json!({ "brand": true }));
    assert!(res.is_err());
  }

  #[test]
  fn proximus_condition_template_and_fallback() {
    let item: ProximusItem = serde_json::from_value(json!({
      "dataOption": "DataPhone 2,5 GB", "optionPrice": 25
    }))
    .unwrap();
    assert_eq!(item.condition().unwrap(), "Avec DataPhone 2,5 GB : €25/mois.");

    let item: ProximusItem =
      serde_json::from_value(json!({ "dataOption": "x", "info_dp": "Avec Mobile Flex" })).unwrap();
    assert_eq!(item.condition().unwrap(), "Avec Mobile Flex");
  }

  #[test]
  fn orange_condition_falls_back_to_quota() {
    let item: OrangeItem =
      serde_json::from_value(json!({ "priceRecurringQuota": 7.5 })).unwrap();
    assert_eq!(item.condition().unwrap(), "Avec Option Data à 7.5€/mois");

    let item: OrangeItem = serde_json::from_value(json!({
      "dataOption": "Go Light", "optionPrice": "10", "priceRecurringQuota": 7
    }))
    .unwrap();
    assert_eq!(item.condition().unwrap(), "Avec Go Light pour 10€/mois");
  }

  #[test]
  fn listing_fields_are_readable() {
    let item: ProximusItem =
      serde_json::from_value(json!({ "title": "Galaxy S24 256GB", "capacity": "256GB" })).unwrap();
    assert_eq!(item.field(ProximusField::Capacity), Some(FieldValue::Text("256GB".into())));
    assert_eq!(
      item.field(ProximusField::Title),
      Some(FieldValue::Text("Galaxy S24 256GB".into()))
    );

    let item: VooItem =
      serde_json::from_value(json!({ "priceAlteration": 129, "code": "SM-S921B" })).unwrap();
    assert_eq!(item.field(VooField::PriceAlteration), Some(FieldValue::Number(129.0)));
    assert_eq!(item.field(VooField::Code), Some(FieldValue::Text("SM-S921B".into())));

    let item: OrangeItem = serde_json::from_value(json!({
      "description": "iPhone 15", "hardDisk": 128, "configurableSku": "apple-iphone-15"
    }))
    .unwrap();
    assert_eq!(item.field(OrangeField::HardDisk), Some(FieldValue::Number(128.0)));
    assert_eq!(
      item.field(OrangeField::Description),
      Some(FieldValue::Text("iPhone 15".into()))
    );
    assert_eq!(
      item.field(OrangeField::ConfigurableSku),
      Some(FieldValue::Text("apple-iphone-15".into()))
    );
  }

  #[test]
  fn feed_roots() {
    assert_eq!(ProximusItem::items(&json!([{}, {}])).unwrap().len(), 2);
    assert!(ProximusItem::items(&json!({ "items": [] })).is_err());

    assert_eq!(VooItem::items(&json!({ "smartphones": [{}] })).unwrap().len(), 1);
    assert!(VooItem::items(&json!([])).is_err());

    assert_eq!(OrangeItem::items(&json!({ "results": [{ "hits": [{}] }] })).unwrap().len(), 1);
    assert!(OrangeItem::items(&json!({})).unwrap().is_empty());
    assert!(OrangeItem::items(&json!({ "results": [] })).unwrap().is_empty());
    assert!(OrangeItem::items(&json!({ "results": [{}] })).unwrap().is_empty());
  }
}
