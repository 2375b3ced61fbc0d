//! Cross-provider identity key.
//!
//! The key is what lets three unrelated feeds agree that they are quoting the
//! same device. It must only depend on (brand, model, storage) after noise has
//! been removed, never on which feed the strings came from.

use crate::normalize::{
  StorageValue, extract_storage, normalize_string, strip_color_suffix,
  strip_storage_tokens,
};

/// Derive the identity key `brand-model-storage`.
///
/// Brand and model are lowercased; a copy of the brand at the start of the
/// model is removed, as are storage tokens and one trailing color word.
/// Whitespace runs become single hyphens. `storage` accepts either gigabytes
/// or free text (`"128 GB"`, `"1TB"`, `"128"`).
///
/// Two distinct models that clean to the same string share a key; color
/// variants of one storage tier collapse on purpose.
pub fn generate_id<'a>(
  brand: &str,
  model: &str,
  storage: impl Into<StorageValue<'a>>,
) -> String {
  let brand = normalize_string(brand);
  let mut model = normalize_string(model);

  if !brand.is_empty()
    && let Some(rest) = model.strip_prefix(brand.as_str())
  {
    model = rest.trim().to_string();
  }

  let model = strip_storage_tokens(&model);
  let model = strip_color_suffix(&model);
  let storage = extract_storage(storage);

  format!("{}-{}-{}", slug(&brand), slug(&model), storage)
}

fn slug(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join("-") }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn casing_brand_echo_and_storage_spelling_agree() {
    let a = generate_id("Apple", "iPhone 14 (128GB)", "128");
    let b = generate_id("apple", "iPhone 14", "128 GB");
    let c = generate_id("APPLE", "iphone 14 128GB", "128");
    assert_eq!(a, "apple-iphone-14-128");
    assert_eq!(a, b);
    assert_eq!(b, c);
  }

  #[test]
  fn brand_inside_model_is_removed() {
    assert_eq!(
      generate_id("Samsung", "Samsung Galaxy S24", 256u32),
      generate_id("samsung", "galaxy s24", 256u32),
    );
  }

  #[test]
  fn color_variants_share_a_key() {
    assert_eq!(
      generate_id("Samsung", "Galaxy S24 Black", "256GB"),
      "samsung-galaxy-s24-256"
    );
    assert_eq!(
      generate_id("Samsung", "Galaxy S24 Silver", 256u32),
      "samsung-galaxy-s24-256"
    );
  }

  #[test]
  fn terabytes_are_expressed_in_gigabytes() {
    assert_eq!(
      generate_id("Apple", "iPhone 15 Pro Max", "1TB"),
      "apple-iphone-15-pro-max-1024"
    );
  }

  #[test]
  fn storage_tiers_stay_distinct() {
    assert_ne!(
      generate_id("Google", "Pixel 8", 128u32),
      generate_id("Google", "Pixel 8", 256u32)
    );
  }

  #[test]
  fn stable_across_calls() {
    let first = generate_id("Fairphone", "Fairphone 5", "256 Go");
    for _ in 0..3 {
      assert_eq!(generate_id("Fairphone", "Fairphone 5", "256 Go"), first);
    }
    assert_eq!(first, "fairphone-5-256");
  }
}
