//! String normalizer for brand, model, color and storage tokens.
//!
//! Everything here is a pure function over borrowed strings. Provider feeds
//! spell the same device in many ways ("iPhone 14 (128GB)", "APPLE iphone 14
//! 128 Go Black"); these helpers reduce that noise before display and before
//! the identity key is derived.

use std::sync::LazyLock;

use regex::Regex;

// ─── Vocabularies ────────────────────────────────────────────────────────────

/// Known brands: lowercase key → display spelling.
pub const BRAND_ALIASES: &[(&str, &str)] = &[
  ("samsung", "Samsung"),
  ("apple", "Apple"),
  ("google", "Google"),
  ("oneplus", "OnePlus"),
  ("fairphone", "Fairphone"),
  ("xiaomi", "Xiaomi"),
  ("motorola", "Motorola"),
  ("nokia", "Nokia"),
  ("oppo", "Oppo"),
  ("sony", "Sony"),
];

/// Color words stripped from the end of model names.
pub const COLORS: &[&str] = &[
  "black", "white", "blue", "red", "green", "yellow", "pink", "purple", "gray",
  "grey", "gold", "silver", "titanium",
];

// ─── Patterns ────────────────────────────────────────────────────────────────

/// A storage token, optionally wrapped in parentheses: `128GB`, `256 Go`,
/// `(1TB)`.
static STORAGE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\s*\(?\s*\d+\s*(?:gb|go|tb)\b\s*\)?")
    .expect("valid storage token regex")
});

static EMPTY_PARENS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\s*\(\s*\)").expect("valid empty parentheses regex")
});

static NETWORK_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\s*\b(?:5g|4g|lte)\s*$").expect("valid network suffix regex")
});

static COLOR_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
  let alternation = COLORS.join("|");
  Regex::new(&format!(r"(?i)\s+(?:{alternation})\s*$"))
    .expect("valid color suffix regex")
});

static TERABYTES: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(\d+)\s*(?:tb|to)\b").expect("valid terabyte regex")
});

static GIGABYTES: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(\d+)\s*(?:gb|go)\b").expect("valid gigabyte regex")
});

// ─── Strings ─────────────────────────────────────────────────────────────────

/// Trim and lowercase. An empty or blank input yields an empty string.
pub fn normalize_string(s: &str) -> String { s.trim().to_lowercase() }

/// Map a brand to its display spelling through [`BRAND_ALIASES`].
///
/// Unknown brands pass through with their original casing (only surrounding
/// whitespace is removed).
pub fn normalize_brand(s: &str) -> String {
  let key = normalize_string(s);
  BRAND_ALIASES
    .iter()
    .find(|(alias, _)| *alias == key)
    .map(|(_, display)| (*display).to_string())
    .unwrap_or_else(|| s.trim().to_string())
}

/// Reduce a provider model string to its display form.
///
/// Steps, in order: strip a leading known brand, strip storage tokens, strip a
/// trailing network generation (`5G`, `4G`, `LTE`) when at least two words
/// remain, strip one trailing color word, trim.
pub fn clean_model(s: &str) -> String {
  let mut model = s.trim();

  if let Some(rest) = strip_known_brand(model) {
    model = rest;
  }

  let mut cleaned = strip_storage_tokens(model);

  let without_network = NETWORK_SUFFIX.replace(&cleaned, "").into_owned();
  if without_network.len() != cleaned.len()
    && without_network.split_whitespace().count() >= 2
  {
    cleaned = without_network;
  }

  strip_color_suffix(&cleaned).trim().to_string()
}

/// Return the remainder of `model` after a leading brand from
/// [`BRAND_ALIASES`], if one is present as a whole word.
fn strip_known_brand(model: &str) -> Option<&str> {
  BRAND_ALIASES.iter().find_map(|(_, display)| {
    let n = display.len();
    if model.len() < n
      || !model.is_char_boundary(n)
      || !model[..n].eq_ignore_ascii_case(display)
    {
      return None;
    }
    let rest = &model[n..];
    match rest.chars().next() {
      None => Some(rest),
      Some(c) if !c.is_alphanumeric() => Some(rest.trim_start()),
      Some(_) => None,
    }
  })
}

/// Remove every storage token and any parentheses left empty by it.
pub(crate) fn strip_storage_tokens(s: &str) -> String {
  let stripped = STORAGE_TOKEN.replace_all(s, " ");
  let stripped = EMPTY_PARENS.replace_all(&stripped, "");
  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove one trailing color word, keeping at least one word.
pub(crate) fn strip_color_suffix(s: &str) -> String {
  COLOR_SUFFIX.replace(s, "").into_owned()
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// A storage capacity as found in a feed: already numeric, or free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageValue<'a> {
  Gigabytes(u32),
  Text(&'a str),
}

impl From<u32> for StorageValue<'_> {
  fn from(gb: u32) -> Self { Self::Gigabytes(gb) }
}

impl<'a> From<&'a str> for StorageValue<'a> {
  fn from(text: &'a str) -> Self { Self::Text(text) }
}

impl<'a> From<&'a String> for StorageValue<'a> {
  fn from(text: &'a String) -> Self { Self::Text(text.as_str()) }
}

/// Storage capacity in gigabytes.
///
/// Numbers are returned as-is. Text containing a terabyte token (`TB`, `To`)
/// is multiplied by 1024; a gigabyte token (`GB`, `Go`) yields its digits; a
/// bare integer is read as gigabytes. Anything else is `0`.
pub fn extract_storage<'a>(value: impl Into<StorageValue<'a>>) -> u32 {
  let text = match value.into() {
    StorageValue::Gigabytes(gb) => return gb,
    StorageValue::Text(text) => text,
  };

  if let Some(tb) = first_number(&TERABYTES, text) {
    return tb.saturating_mul(1024);
  }
  if let Some(gb) = first_number(&GIGABYTES, text) {
    return gb;
  }
  text.trim().parse().unwrap_or(0)
}

fn first_number(re: &Regex, text: &str) -> Option<u32> {
  re.captures(text)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  // ── normalize_string / normalize_brand
  // ───────────────────────────────────────────

  #[test]
  fn normalize_string_trims_and_lowercases() {
    assert_eq!(normalize_string("  SamSung "), "samsung");
    assert_eq!(normalize_string(""), "");
    assert_eq!(normalize_string("   "), "");
  }

  #[test]
  fn known_brands_get_display_spelling() {
    assert_eq!(normalize_brand("samsung"), "Samsung");
    assert_eq!(normalize_brand(" ONEPLUS"), "OnePlus");
    assert_eq!(normalize_brand("Apple"), "Apple");
  }

  #[test]
  fn unknown_brand_passes_through() {
    assert_eq!(normalize_brand("obscurebrand"), "obscurebrand");
    assert_eq!(normalize_brand("HMD Global"), "HMD Global");
  }

  // ── clean_model
  // ──────────────────────────────────────────────────────────────

  #[test]
  fn strips_brand_storage_and_color() {
    assert_eq!(clean_model("Samsung Galaxy S24 256GB Black"), "Galaxy S24");
    assert_eq!(clean_model("Galaxy S24 Black"), "Galaxy S24");
    assert_eq!(clean_model("iPhone 14 (128GB)"), "iPhone 14");
    assert_eq!(clean_model("  Pixel 8 Pro 128 Go  "), "Pixel 8 Pro");
  }

  #[test]
  fn brand_prefix_must_be_whole_word() {
    assert_eq!(clean_model("Applesauce X"), "Applesauce X");
    assert_eq!(clean_model("APPLE iPhone 15"), "iPhone 15");
  }

  #[test]
  fn network_suffix_only_dropped_when_name_stays_descriptive() {
    assert_eq!(clean_model("Galaxy A55 5G"), "Galaxy A55");
    assert_eq!(clean_model("Redmi Note 13 LTE"), "Redmi Note 13");
    // Dropping the tag would leave a single word.
    assert_eq!(clean_model("Pixel 5G"), "Pixel 5G");
  }

  #[test]
  fn only_one_trailing_color_is_removed() {
    assert_eq!(clean_model("iPhone 15 Pro Black Titanium"), "iPhone 15 Pro Black");
    // A lone color word is kept: there is no whitespace before it.
    assert_eq!(clean_model("Black"), "Black");
  }

  #[test]
  fn color_is_checked_after_network() {
    // Order matters: the network tag is not trailing until the color goes,
    // and the color step runs last.
    assert_eq!(clean_model("Galaxy S24 5G Black"), "Galaxy S24 5G");
  }

  // ── extract_storage
  // ──────────────────────────────────────────────────────────

  #[test]
  fn storage_units() {
    assert_eq!(extract_storage("1 TB"), 1024);
    assert_eq!(extract_storage("2To"), 2048);
    assert_eq!(extract_storage("256GB"), 256);
    assert_eq!(extract_storage("128 Go"), 128);
    assert_eq!(extract_storage(128u32), 128);
  }

  #[test]
  fn storage_bare_integer_and_garbage() {
    assert_eq!(extract_storage("512"), 512);
    assert_eq!(extract_storage("Galaxy S24"), 0);
    assert_eq!(extract_storage(""), 0);
  }

  #[test]
  fn storage_found_inside_a_title() {
    assert_eq!(extract_storage("Apple iPhone 15 Pro 256GB Black"), 256);
    assert_eq!(extract_storage("Galaxy S24 Ultra 1TB"), 1024);
  }

  #[test]
  fn unit_must_end_a_word() {
    assert_eq!(extract_storage("Pixel 8 Gold"), 0);
    assert_eq!(extract_storage("Pixel 8 Gold 128GB"), 128);
    assert_eq!(extract_storage("Galaxy Z Flip6 Tornado"), 0);
    assert_eq!(extract_storage("Pixel 8 128 Go"), 128);
  }
}
