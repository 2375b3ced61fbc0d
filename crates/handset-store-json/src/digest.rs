//! Content digests for persisted documents.
//!
//! The catalog digest is a SHA-256 over the exact bytes written to disk, so
//! two syncs producing the same catalog produce the same digest.

use handset_core::Smartphone;
use sha2::{Digest, Sha256};

use crate::Result;

/// The on-disk encoding of a document: pretty JSON with a trailing newline.
pub(crate) fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
  let mut bytes = serde_json::to_vec_pretty(value)?;
  bytes.push(b'\n');
  Ok(bytes)
}

/// Hex SHA-256 of `bytes`.
pub fn digest_bytes(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }

/// Digest of `catalog` as [`crate::JsonStore`] would write it.
pub fn catalog_digest(catalog: &[Smartphone]) -> Result<String> {
  Ok(digest_bytes(&encode(catalog)?))
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use handset_core::{Provider, UpfrontPrice};

  use super::*;

  fn phone(id: &str, price: u32) -> Smartphone {
    Smartphone {
      id:             id.into(),
      brand:          "Google".into(),
      model:          "Pixel 8".into(),
      storage:        128,
      image_url:      String::new(),
      upfront_prices: BTreeMap::from([(Provider::Orange, UpfrontPrice {
        price,
        condition: None,
        url: None,
      })]),
    }
  }

  #[test]
  fn same_catalog_same_digest() {
    let a = vec![phone("google-pixel-8-128", 599)];
    assert_eq!(catalog_digest(&a).unwrap(), catalog_digest(&a.clone()).unwrap());
    assert_eq!(catalog_digest(&a).unwrap().len(), 64);
  }

  #[test]
  fn price_change_changes_digest() {
    let a = vec![phone("google-pixel-8-128", 599)];
    let b = vec![phone("google-pixel-8-128", 579)];
    assert_ne!(catalog_digest(&a).unwrap(), catalog_digest(&b).unwrap());
  }

  #[test]
  fn order_is_part_of_the_content() {
    let a = vec![phone("a", 1), phone("b", 2)];
    let b = vec![phone("b", 2), phone("a", 1)];
    assert_ne!(catalog_digest(&a).unwrap(), catalog_digest(&b).unwrap());
  }
}
