//! Price history: an append-only time series per (smartphone, provider).
//!
//! Points are never rewritten. A new point is only recorded when the price
//! differs from the latest one, so the series reads as a list of changes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Provider;

// ─── Points and entries ──────────────────────────────────────────────────────

/// A price observed on a calendar day (serialized as `YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
  pub price: u32,
  pub date:  NaiveDate,
}

/// The series for one (smartphone, provider) pair.
///
/// `prices` is private: the only mutation is [`PriceHistoryEntry::append`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
  pub smartphone_id: String,
  pub provider:      Provider,
  prices:            Vec<PricePoint>,
}

impl PriceHistoryEntry {
  /// Start a series with its first observation.
  pub fn seeded(
    smartphone_id: impl Into<String>,
    provider: Provider,
    price: u32,
    date: NaiveDate,
  ) -> Self {
    Self {
      smartphone_id: smartphone_id.into(),
      provider,
      prices: vec![PricePoint { price, date }],
    }
  }

  pub fn prices(&self) -> &[PricePoint] { &self.prices }

  pub fn latest(&self) -> Option<&PricePoint> { self.prices.last() }

  /// Append a point. Dates never move backwards: a point dated before the
  /// latest one is recorded on the latest date instead.
  pub fn append(&mut self, price: u32, date: NaiveDate) -> PricePoint {
    let date = match self.latest() {
      Some(last) if last.date > date => last.date,
      _ => date,
    };
    let point = PricePoint { price, date };
    self.prices.push(point);
    point
  }
}

// ─── Collection ──────────────────────────────────────────────────────────────

type PairKey = (String, Provider);

/// The whole price-history log, indexed by (smartphone id, provider).
///
/// Serializes as a flat JSON array of entries in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PriceHistoryEntry>", into = "Vec<PriceHistoryEntry>")]
pub struct PriceHistory {
  entries: Vec<PriceHistoryEntry>,
  #[serde(skip)]
  index:   HashMap<PairKey, usize>,
}

impl PriceHistory {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn entries(&self) -> &[PriceHistoryEntry] { &self.entries }

  pub fn get(&self, smartphone_id: &str, provider: Provider) -> Option<&PriceHistoryEntry> {
    let idx = *self.index.get(&(smartphone_id.to_string(), provider))?;
    self.entries.get(idx)
  }

  pub fn get_mut(
    &mut self,
    smartphone_id: &str,
    provider: Provider,
  ) -> Option<&mut PriceHistoryEntry> {
    let idx = *self.index.get(&(smartphone_id.to_string(), provider))?;
    self.entries.get_mut(idx)
  }

  /// Add a new series. Returns `false` (and leaves the log untouched) if the
  /// pair already has one.
  pub fn insert(&mut self, entry: PriceHistoryEntry) -> bool {
    let key = (entry.smartphone_id.clone(), entry.provider);
    if self.index.contains_key(&key) {
      return false;
    }
    self.index.insert(key, self.entries.len());
    self.entries.push(entry);
    true
  }
}

impl From<Vec<PriceHistoryEntry>> for PriceHistory {
  /// Later duplicates of a pair are kept in the log but never indexed, so
  /// they are preserved verbatim and never extended.
  fn from(entries: Vec<PriceHistoryEntry>) -> Self {
    let mut index = HashMap::with_capacity(entries.len());
    for (i, e) in entries.iter().enumerate() {
      index.entry((e.smartphone_id.clone(), e.provider)).or_insert(i);
    }
    Self { entries, index }
  }
}

impl From<PriceHistory> for Vec<PriceHistoryEntry> {
  fn from(history: PriceHistory) -> Self { history.entries }
}
