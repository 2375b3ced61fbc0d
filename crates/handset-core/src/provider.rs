//! The fixed set of telecom operators that supply feeds and price quotes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::Error;

/// A telecom operator.
///
/// Declaration order is merge priority: the first provider is the primary
/// source for brand, model and image when several feeds describe the same
/// device. `Ord` follows the same order, which also fixes the key order of
/// serialized price maps.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
  /// Flat array feed.
  Proximus,
  /// Items wrapped under a `smartphones` property.
  Voo,
  /// Search-index feed; items live under `results[0].hits`.
  Orange,
}

impl Provider {
  /// All providers in merge-priority order.
  pub fn in_priority_order() -> impl Iterator<Item = Provider> { Self::iter() }

  /// The lowercase name used in file names and serialized maps.
  pub fn as_str(self) -> &'static str { self.into() }
}

impl FromStr for Provider {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();
    Self::iter()
      .find(|p| p.as_str() == wanted)
      .ok_or_else(|| Error::UnknownProvider(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn priority_order_is_declaration_order() {
    let order: Vec<_> = Provider::in_priority_order().collect();
    assert_eq!(order, vec![Provider::Proximus, Provider::Voo, Provider::Orange]);
  }

  #[test]
  fn parse_is_case_insensitive() {
    assert_eq!("VOO".parse::<Provider>().unwrap(), Provider::Voo);
    assert_eq!(" orange ".parse::<Provider>().unwrap(), Provider::Orange);
    assert!("base".parse::<Provider>().is_err());
  }

  #[test]
  fn serializes_lowercase() {
    let json = serde_json::to_string(&Provider::Proximus).unwrap();
    assert_eq!(json, "\"proximus\"");
    assert_eq!(Provider::Orange.to_string(), "orange");
  }
}
