//! Runtime configuration, deserialised from `handset.toml` and `HANDSET_*`
//! environment variables.
//!
//! Relative paths resolve against `data_dir`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use handset_core::Provider;
use handset_store_json::{ALERTS_FILE, CATALOG_FILE, HISTORY_FILE, StorePaths};
use serde::Deserialize;

use crate::notify::DEFAULT_BASE_URL;

/// Input file per provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedFiles {
  pub proximus: PathBuf,
  pub voo:      PathBuf,
  pub orange:   PathBuf,
}

impl Default for FeedFiles {
  fn default() -> Self {
    Self {
      proximus: "proximus.json".into(),
      voo:      "voo.json".into(),
      orange:   "orange.json".into(),
    }
  }
}

impl FeedFiles {
  pub fn for_provider(&self, provider: Provider) -> &Path {
    match provider {
      Provider::Proximus => &self.proximus,
      Provider::Voo => &self.voo,
      Provider::Orange => &self.orange,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  pub data_dir:        PathBuf,
  pub feeds:           FeedFiles,
  /// Field mapping overrides. The built-in mapping applies when unset.
  pub mapping_file:    Option<PathBuf>,
  pub catalog_file:    PathBuf,
  pub history_file:    PathBuf,
  pub alerts_file:     PathBuf,
  /// Where price-change emails are queued. Unset means log only.
  pub outbox_file:     Option<PathBuf>,
  pub lock_file:       PathBuf,
  /// Age after which a leftover lock file is considered abandoned.
  pub lock_stale_secs: u64,
  /// Merge fresh feeds onto the previous catalog instead of rebuilding it,
  /// keeping quotes from providers whose feed is missing this run.
  pub carry_forward:   bool,
  pub base_url:        String,
  pub mail_from:       String,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      data_dir:        "data".into(),
      feeds:           FeedFiles::default(),
      mapping_file:    None,
      catalog_file:    CATALOG_FILE.into(),
      history_file:    HISTORY_FILE.into(),
      alerts_file:     ALERTS_FILE.into(),
      outbox_file:     None,
      lock_file:       "handset.lock".into(),
      lock_stale_secs: 3600,
      carry_forward:   false,
      base_url:        DEFAULT_BASE_URL.into(),
      mail_from:       "alertes@jointoffer.be".into(),
    }
  }
}

impl SyncConfig {
  /// A default configuration rooted at `dir`.
  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    Self {
      data_dir: dir.into(),
      ..Self::default()
    }
  }

  /// `path` if absolute, else `data_dir/path`.
  pub fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.data_dir.join(path)
    }
  }

  pub fn feed_path(&self, provider: Provider) -> PathBuf {
    self.resolve(self.feeds.for_provider(provider))
  }

  pub fn store_paths(&self) -> StorePaths {
    StorePaths {
      catalog: self.resolve(&self.catalog_file),
      history: self.resolve(&self.history_file),
      alerts:  self.resolve(&self.alerts_file),
    }
  }

  pub fn mapping_path(&self) -> Option<PathBuf> {
    self.mapping_file.as_deref().map(|p| self.resolve(p))
  }

  pub fn outbox_path(&self) -> Option<PathBuf> {
    self.outbox_file.as_deref().map(|p| self.resolve(p))
  }

  pub fn lock_path(&self) -> PathBuf { self.resolve(&self.lock_file) }

  pub fn lock_stale_after(&self) -> Duration { Duration::from_secs(self.lock_stale_secs) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_paths_resolve_against_data_dir() {
    let cfg = SyncConfig::in_dir("/srv/handset");
    assert_eq!(cfg.feed_path(Provider::Voo), PathBuf::from("/srv/handset/voo.json"));
    assert_eq!(cfg.store_paths().catalog, PathBuf::from("/srv/handset/smartphones.json"));
    assert_eq!(
      cfg.store_paths().history,
      PathBuf::from("/srv/handset/smartphone-price-history.json")
    );
    assert_eq!(cfg.mapping_path(), None);
  }

  #[test]
  fn absolute_paths_are_kept() {
    let cfg = SyncConfig {
      outbox_file: Some("/var/spool/handset/outbox.jsonl".into()),
      ..SyncConfig::in_dir("data")
    };
    assert_eq!(cfg.outbox_path(), Some(PathBuf::from("/var/spool/handset/outbox.jsonl")));
  }

  #[test]
  fn partial_documents_fill_defaults() {
    let cfg: SyncConfig = serde_json::from_value(serde_json::json!({
      "data_dir": "/tmp/x",
      "carry_forward": true,
      "feeds": { "voo": "voo-export.json" }
    }))
    .unwrap();
    assert!(cfg.carry_forward);
    assert_eq!(cfg.feeds.voo, PathBuf::from("voo-export.json"));
    assert_eq!(cfg.feeds.orange, PathBuf::from("orange.json"));
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.lock_stale_after(), Duration::from_secs(3600));
  }
}
