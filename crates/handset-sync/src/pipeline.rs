//! The two scheduled jobs: feed sync and price check.
//!
//! Both hold the run lock for their whole read-merge-write sequence, so two
//! runs never interleave writes to the same documents.

use std::path::Path;

use chrono::NaiveDate;
use handset_core::{AlertRegistry, AlertSet, CatalogStore, Notifier, Provider};
use handset_feeds::{Extraction, FeedMappings, extract};
use handset_store_json::RunLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
  Error, Result,
  config::SyncConfig,
  reconcile::{MergePolicy, reconcile_onto},
  tracker::{PriceCheckReport, track_prices},
};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Per-provider extraction counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
  pub provider:   Provider,
  pub total:      usize,
  pub extracted:  usize,
  pub skipped:    usize,
  pub failed:     usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub feed_error: Option<String>,
}

impl From<&Extraction> for FeedSummary {
  fn from(e: &Extraction) -> Self {
    Self {
      provider:   e.provider,
      total:      e.total,
      extracted:  e.items.len(),
      skipped:    e.skipped,
      failed:     e.failed,
      feed_error: e.feed_error.clone(),
    }
  }
}

/// Outcome of [`run_sync`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
  pub feeds:   Vec<FeedSummary>,
  pub records: usize,
  /// Ids dropped by validation.
  pub dropped: Vec<String>,
  pub digest:  String,
  /// False when the catalog written is byte-identical to the previous one.
  pub changed: bool,
}

// ─── Feed loading ────────────────────────────────────────────────────────────

/// The configured mapping, or the built-in one.
pub async fn load_mappings(config: &SyncConfig) -> Result<FeedMappings> {
  let Some(path) = config.mapping_path() else {
    return Ok(FeedMappings::default());
  };
  let text = tokio::fs::read_to_string(&path)
    .await
    .map_err(|e| Error::io(&path, e))?;
  let mappings = FeedMappings::from_json(&text)?;
  info!(path = %path.display(), "feed mappings loaded");
  Ok(mappings)
}

/// Read and extract one provider feed. A missing or unparseable file yields
/// an empty extraction so the other providers still sync.
pub async fn load_feed(provider: Provider, path: &Path, mappings: &FeedMappings) -> Extraction {
  let bytes = match tokio::fs::read(path).await {
    Ok(bytes) => bytes,
    Err(e) => {
      warn!(%provider, path = %path.display(), error = %e, "feed unreadable, treating as empty");
      return Extraction::unusable(provider, e.to_string());
    }
  };
  let root: Value = match serde_json::from_slice(&bytes) {
    Ok(root) => root,
    Err(e) => {
      warn!(%provider, path = %path.display(), error = %e, "feed is not JSON, treating as empty");
      return Extraction::unusable(provider, e.to_string());
    }
  };
  extract(provider, &root, mappings)
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

/// Rebuild the catalog from the provider feeds and persist it.
pub async fn run_sync<S: CatalogStore>(config: &SyncConfig, store: &S) -> Result<SyncReport> {
  let _lock = RunLock::acquire(config.lock_path(), config.lock_stale_after()).map_err(Error::Lock)?;

  let mappings = load_mappings(config).await?;
  let (proximus, voo, orange) = (
    config.feed_path(Provider::Proximus),
    config.feed_path(Provider::Voo),
    config.feed_path(Provider::Orange),
  );
  let (proximus, voo, orange) = tokio::join!(
    load_feed(Provider::Proximus, &proximus, &mappings),
    load_feed(Provider::Voo, &voo, &mappings),
    load_feed(Provider::Orange, &orange, &mappings),
  );
  let extractions = [proximus, voo, orange];

  let seed = if config.carry_forward {
    store.load_catalog().await.map_err(Error::store)?
  } else {
    Vec::new()
  };
  let reconciled = reconcile_onto(seed, &extractions, &MergePolicy::STANDARD);

  let receipt = store
    .save_catalog(&reconciled.catalog)
    .await
    .map_err(Error::store)?;

  let report = SyncReport {
    feeds:   extractions.iter().map(FeedSummary::from).collect(),
    records: reconciled.catalog.len(),
    dropped: reconciled.dropped,
    digest:  receipt.digest,
    changed: receipt.changed,
  };
  info!(
    records = report.records,
    dropped = report.dropped.len(),
    digest = %report.digest,
    changed = report.changed,
    "sync complete"
  );
  Ok(report)
}

/// Record the catalog's prices into the history and notify matching alerts.
/// The history is saved once, after every notification was attempted.
pub async fn run_price_check<S, N>(
  config: &SyncConfig,
  store: &S,
  notifier: &N,
  today: NaiveDate,
) -> Result<PriceCheckReport>
where
  S: CatalogStore + AlertRegistry,
  N: Notifier,
{
  let _lock = RunLock::acquire(config.lock_path(), config.lock_stale_after()).map_err(Error::Lock)?;

  let catalog = store.load_catalog().await.map_err(Error::store)?;
  let mut history = store.load_history().await.map_err(Error::store)?;
  let alerts = AlertSet {
    alerts: store.get_alerts().await.map_err(Error::store)?,
  };

  let report = track_prices(&catalog, &mut history, &alerts, notifier, today).await;
  store.save_history(&history).await.map_err(Error::store)?;
  Ok(report)
}
