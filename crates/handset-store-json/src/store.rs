//! [`JsonStore`]: flat JSON files implementing [`CatalogStore`] and
//! [`AlertRegistry`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use chrono::Utc;
use handset_core::{
  AlertRegistry, AlertSet, CatalogStore, NewAlert, PreferencesPatch, PriceAlert, PriceHistory,
  SaveReceipt, Smartphone, normalize_email,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  digest::{digest_bytes, encode},
};

pub const CATALOG_FILE: &str = "smartphones.json";
pub const HISTORY_FILE: &str = "smartphone-price-history.json";
pub const ALERTS_FILE: &str = "price-alerts.json";

// ─── Paths ───────────────────────────────────────────────────────────────────

/// Where each document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
  pub catalog: PathBuf,
  pub history: PathBuf,
  pub alerts:  PathBuf,
}

impl StorePaths {
  /// The default file names inside `dir`.
  pub fn in_dir(dir: impl AsRef<Path>) -> Self {
    let dir = dir.as_ref();
    Self {
      catalog: dir.join(CATALOG_FILE),
      history: dir.join(HISTORY_FILE),
      alerts:  dir.join(ALERTS_FILE),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// File-backed storage for the catalog, the price history and the alert
/// registry.
///
/// A document that does not exist yet reads as empty; one that exists but
/// does not parse is an error. Every write goes to a sibling temporary file
/// first and is renamed over the target, so readers never see a partial
/// document.
#[derive(Debug)]
pub struct JsonStore {
  paths:        StorePaths,
  /// Serializes read-modify-write cycles on the alert registry.
  alerts_guard: Mutex<()>,
}

impl JsonStore {
  pub fn new(paths: StorePaths) -> Self {
    Self {
      paths,
      alerts_guard: Mutex::new(()),
    }
  }

  /// A store using the default file names inside `dir`.
  pub fn in_dir(dir: impl AsRef<Path>) -> Self { Self::new(StorePaths::in_dir(dir)) }

  pub fn paths(&self) -> &StorePaths { &self.paths }

  // ── Alert registry management ───────────────────────────────────────────

  /// Register a new alert.
  ///
  /// Fails on a malformed email, on a smartphone id absent from the catalog,
  /// and when the same (email, smartphone, provider) is already registered.
  pub async fn create_alert(&self, input: NewAlert) -> Result<PriceAlert> {
    input.validate()?;

    let catalog = self.load_catalog().await?;
    if !catalog.iter().any(|p| p.id == input.smartphone_id) {
      return Err(Error::UnknownSmartphone(input.smartphone_id));
    }

    let _guard = self.alerts_guard.lock().await;
    let mut set = self.load_alert_set().await?;
    if set
      .alerts
      .iter()
      .any(|a| a.same_subscription(&input.email, &input.smartphone_id, input.provider))
    {
      return Err(Error::DuplicateAlert {
        email:         input.email.trim().to_lowercase(),
        smartphone_id: input.smartphone_id,
        provider:      input.provider,
      });
    }

    let alert = PriceAlert::new(input, Utc::now());
    set.alerts.push(alert.clone());
    write_json(&self.paths.alerts, &set).await?;
    info!(
      id = %alert.id,
      smartphone = %alert.smartphone_id,
      provider = %alert.provider,
      "alert created"
    );
    Ok(alert)
  }

  /// Remove an alert, returning it.
  pub async fn delete_alert(&self, id: Uuid) -> Result<PriceAlert> {
    let _guard = self.alerts_guard.lock().await;
    let mut set = self.load_alert_set().await?;
    let idx = set
      .alerts
      .iter()
      .position(|a| a.id == id)
      .ok_or(Error::AlertNotFound(id))?;
    let removed = set.alerts.remove(idx);
    write_json(&self.paths.alerts, &set).await?;
    info!(%id, "alert deleted");
    Ok(removed)
  }

  /// All alerts registered by `email` (case-insensitive).
  pub async fn alerts_by_email(&self, email: &str) -> Result<Vec<PriceAlert>> {
    let email = normalize_email(email);
    let set = self.load_alert_set().await?;
    Ok(
      set
        .alerts
        .into_iter()
        .filter(|a| a.email == email)
        .collect(),
    )
  }

  /// Merge `patch` into an alert's preferences; other fields are untouched.
  pub async fn update_alert_preferences(
    &self,
    id: Uuid,
    patch: PreferencesPatch,
  ) -> Result<PriceAlert> {
    let _guard = self.alerts_guard.lock().await;
    let mut set = self.load_alert_set().await?;
    let alert = set
      .alerts
      .iter_mut()
      .find(|a| a.id == id)
      .ok_or(Error::AlertNotFound(id))?;
    alert.preferences.apply(patch);
    let updated = alert.clone();
    write_json(&self.paths.alerts, &set).await?;
    debug!(%id, preferences = ?updated.preferences, "alert preferences updated");
    Ok(updated)
  }

  async fn load_alert_set(&self) -> Result<AlertSet> { read_json(&self.paths.alerts).await }
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl CatalogStore for JsonStore {
  type Error = Error;

  async fn load_catalog(&self) -> Result<Vec<Smartphone>> { read_json(&self.paths.catalog).await }

  async fn save_catalog(&self, catalog: &[Smartphone]) -> Result<SaveReceipt> {
    let bytes = encode(catalog)?;
    let digest = digest_bytes(&bytes);
    let changed = match tokio::fs::read(&self.paths.catalog).await {
      Ok(previous) => digest_bytes(&previous) != digest,
      Err(e) if e.kind() == ErrorKind::NotFound => true,
      Err(e) => return Err(Error::io(&self.paths.catalog, e)),
    };
    write_atomic(&self.paths.catalog, &bytes).await?;
    debug!(
      path = %self.paths.catalog.display(),
      records = catalog.len(),
      %digest,
      changed,
      "catalog written"
    );
    Ok(SaveReceipt { digest, changed })
  }

  async fn load_history(&self) -> Result<PriceHistory> { read_json(&self.paths.history).await }

  async fn save_history(&self, history: &PriceHistory) -> Result<()> {
    write_json(&self.paths.history, history).await?;
    debug!(path = %self.paths.history.display(), series = history.len(), "history written");
    Ok(())
  }
}

impl AlertRegistry for JsonStore {
  type Error = Error;

  async fn get_alerts(&self) -> Result<Vec<PriceAlert>> {
    Ok(self.load_alert_set().await?.alerts)
  }
}

// ─── File helpers ────────────────────────────────────────────────────────────

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
  let bytes = match tokio::fs::read(path).await {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
    Err(e) => return Err(Error::io(path, e)),
  };
  serde_json::from_slice(&bytes).map_err(|source| Error::Corrupt {
    path: path.to_path_buf(),
    source,
  })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  write_atomic(path, &encode(value)?).await
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(dir)
      .await
      .map_err(|e| Error::io(dir, e))?;
  }

  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);

  tokio::fs::write(&tmp, bytes)
    .await
    .map_err(|e| Error::io(&tmp, e))?;
  tokio::fs::rename(&tmp, path)
    .await
    .map_err(|e| Error::io(path, e))
}
