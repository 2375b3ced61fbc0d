//! Named value transforms applied to feed fields.
//!
//! A transform list is resolved once, when the mapping document is
//! deserialized; an unknown name is a load error rather than a silent no-op.

use std::{fmt, sync::LazyLock};

use handset_core::normalize::{clean_model, extract_storage, normalize_brand, normalize_string};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the field value in [`Transform::UrlTemplate`].
pub const TEMPLATE_PLACEHOLDER: &str = "{value}";

static PRICE_NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d+([.,]\d+)?").expect("valid price regex"));

static GO_SUFFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\s*go\s*$").expect("valid go suffix regex"));

// ─── Values ──────────────────────────────────────────────────────────────────

/// A scalar read out of a provider item.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  Text(String),
  Number(f64),
}

impl FieldValue {
  /// Whether the value counts as supplied: non-blank text or a non-zero
  /// number.
  pub fn is_present(&self) -> bool {
    match self {
      Self::Text(s) => !s.trim().is_empty(),
      Self::Number(n) => *n != 0.0 && !n.is_nan(),
    }
  }

  pub fn into_text(self) -> String {
    match self {
      Self::Text(s) => s,
      Self::Number(n) => n.to_string(),
    }
  }

  /// Storage in gigabytes, see [`extract_storage`].
  pub fn as_storage(&self) -> u32 {
    match self {
      Self::Text(s) => extract_storage(s.as_str()),
      Self::Number(n) => to_whole(*n),
    }
  }

  /// Whole-euro price. Numbers are rounded; text yields its first decimal
  /// number (comma or dot separator), rounded. Anything else is `0`.
  pub fn as_price(&self) -> u32 {
    match self {
      Self::Number(n) => to_whole(*n),
      Self::Text(s) => PRICE_NUMBER
        .find(s)
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .map(to_whole)
        .unwrap_or(0),
    }
  }
}

impl fmt::Display for FieldValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => f.write_str(s),
      Self::Number(n) => write!(f, "{n}"),
    }
  }
}

fn to_whole(n: f64) -> u32 {
  if n.is_finite() && n > 0.0 {
    n.round().min(u32::MAX as f64) as u32
  } else {
    0
  }
}

// ─── Transforms ──────────────────────────────────────────────────────────────

/// One step of a field's transform chain.
///
/// Unit variants appear in JSON as plain strings (`"price"`); the template
/// variant as `{"url_template": {"template": "https://…/{value}"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
  NormalizeString,
  NormalizeBrand,
  CleanModel,
  ExtractStorage,
  Price,
  RemoveGoSuffix,
  FirstWord,
  UrlTemplate { template: String },
}

impl Transform {
  pub fn apply(&self, value: FieldValue) -> FieldValue {
    match self {
      Self::NormalizeString => FieldValue::Text(normalize_string(&value.into_text())),
      Self::NormalizeBrand => FieldValue::Text(normalize_brand(&value.into_text())),
      Self::CleanModel => FieldValue::Text(clean_model(&value.into_text())),
      Self::ExtractStorage => FieldValue::Number(value.as_storage().into()),
      Self::Price => FieldValue::Number(value.as_price().into()),
      Self::RemoveGoSuffix => {
        FieldValue::Text(GO_SUFFIX.replace(&value.into_text(), "").into_owned())
      }
      Self::FirstWord => FieldValue::Text(
        value
          .into_text()
          .split_whitespace()
          .next()
          .unwrap_or_default()
          .to_string(),
      ),
      Self::UrlTemplate { template } => {
        FieldValue::Text(template.replace(TEMPLATE_PLACEHOLDER, value.to_string().trim()))
      }
    }
  }
}

/// Run `value` through `chain` left to right.
pub fn apply_all(chain: &[Transform], value: FieldValue) -> FieldValue {
  chain.iter().fold(value, |v, t| t.apply(v))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> FieldValue { FieldValue::Text(s.to_string()) }

  #[test]
  fn price_coercion() {
    assert_eq!(FieldValue::Number(899.5).as_price(), 900);
    assert_eq!(text("€ 1.049,99").as_price(), 1);
    assert_eq!(text("1049,99 €").as_price(), 1050);
    assert_eq!(text("899.4").as_price(), 899);
    assert_eq!(text("gratuit").as_price(), 0);
    assert_eq!(FieldValue::Number(-3.0).as_price(), 0);
  }

  #[test]
  fn presence() {
    assert!(!text("  ").is_present());
    assert!(!FieldValue::Number(0.0).is_present());
    assert!(text("0").is_present());
    assert!(FieldValue::Number(1.0).is_present());
  }

  #[test]
  fn numbers_display_without_trailing_zero() {
    assert_eq!(FieldValue::Number(25.0).to_string(), "25");
    assert_eq!(FieldValue::Number(12.5).to_string(), "12.5");
  }

  #[test]
  fn chains_run_in_order() {
    let chain = [Transform::RemoveGoSuffix, Transform::ExtractStorage];
    assert_eq!(apply_all(&chain, text("256 Go")), FieldValue::Number(256.0));

    let chain = [Transform::FirstWord, Transform::NormalizeBrand];
    assert_eq!(apply_all(&chain, text("samsung Galaxy A55")), text("Samsung"));
  }

  #[test]
  fn url_template_substitutes_value() {
    let t = Transform::UrlTemplate {
      template: "https://www.voo.be/fr/mobile/smartphones/{value}".into(),
    };
    assert_eq!(
      t.apply(text("galaxy-s24")),
      text("https://www.voo.be/fr/mobile/smartphones/galaxy-s24")
    );
  }

  #[test]
  fn remove_go_suffix() {
    assert_eq!(Transform::RemoveGoSuffix.apply(text("128 GO")), text("128"));
    assert_eq!(Transform::RemoveGoSuffix.apply(text("Google")), text("Google"));
  }

  #[test]
  fn json_names_resolve_at_load_time() {
    let chain: Vec<Transform> = serde_json::from_str(
      r#"["normalize_brand", {"url_template": {"template": "x/{value}"}}]"#,
    )
    .unwrap();
    assert_eq!(chain[0], Transform::NormalizeBrand);
    assert!(matches!(chain[1], Transform::UrlTemplate { .. }));

    assert!(serde_json::from_str::<Vec<Transform>>(r#"["to_upper"]"#).is_err());
  }
}
