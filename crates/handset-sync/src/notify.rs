//! Price-change notifications.
//!
//! [`PriceChangeEmail`] renders a notice into the message subscribers
//! receive. Delivery is pluggable: [`LogNotifier`] only logs, and
//! [`OutboxNotifier`] appends each message as one JSON line to an outbox file
//! that a mail relay drains.

use std::{
  convert::Infallible,
  path::{Path, PathBuf},
};

use handset_core::{Notifier, PriceChangeNotice};
use serde::{Deserialize, Serialize};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use tracing::info;

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://www.jointoffer.be";

// ─── Message ─────────────────────────────────────────────────────────────────

/// A rendered notification, as written to the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChangeEmail {
  pub from:    String,
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

impl PriceChangeEmail {
  pub fn compose(notice: &PriceChangeNotice, from: &str, base_url: &str) -> Self {
    let phone = &notice.smartphone;
    let direction = if notice.is_decrease() {
      "Baisse"
    } else {
      "Augmentation"
    };
    let subject = format!("{direction} de prix - {}", phone.display_name());

    let alert_kind = if notice.alert.preferences.notify_on_any_change {
      "Tout changement de prix"
    } else {
      "Baisse de prix uniquement"
    };
    let link = format!(
      "{}/search?phone={}",
      base_url.trim_end_matches('/'),
      phone.id
    );

    let body = format!(
      "Bonjour,\n\n\
       Le prix du {name} ({storage} Go) a changé.\n\n\
       Ancien prix : {old}€\n\
       Nouveau prix : {new}€\n\
       {direction} de {amount}€\n\
       Fournisseur : {provider}\n\n\
       Type d'alerte : {alert_kind}\n\n\
       Voir l'offre : {link}\n",
      name = phone.display_name(),
      storage = phone.storage,
      old = notice.old_price,
      new = notice.new_price,
      amount = change_amount(notice.old_price, notice.new_price),
      provider = notice.provider,
    );

    Self {
      from: from.to_string(),
      to: notice.email.clone(),
      subject,
      body,
    }
  }
}

/// Absolute difference with two decimals, e.g. `"50.00"`.
fn change_amount(old: u32, new: u32) -> String { format!("{:.2}", f64::from(old.abs_diff(new))) }

// ─── Notifiers ───────────────────────────────────────────────────────────────

/// Logs each message instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogNotifier {
  pub from:     String,
  pub base_url: String,
}

impl Notifier for LogNotifier {
  type Error = Infallible;

  async fn send_price_change(&self, notice: &PriceChangeNotice) -> Result<(), Infallible> {
    let email = PriceChangeEmail::compose(notice, &self.from, &self.base_url);
    info!(to = %email.to, subject = %email.subject, "price change notification (not sent)");
    Ok(())
  }
}

/// Appends each message as a JSON line to a file.
#[derive(Debug)]
pub struct OutboxNotifier {
  path:     PathBuf,
  from:     String,
  base_url: String,
  write:    Mutex<()>,
}

impl OutboxNotifier {
  pub fn new(path: impl Into<PathBuf>, from: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      path:     path.into(),
      from:     from.into(),
      base_url: base_url.into(),
      write:    Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path { &self.path }
}

impl Notifier for OutboxNotifier {
  type Error = Error;

  async fn send_price_change(&self, notice: &PriceChangeNotice) -> Result<()> {
    let email = PriceChangeEmail::compose(notice, &self.from, &self.base_url);
    let mut line = serde_json::to_vec(&email)?;
    line.push(b'\n');

    let _guard = self.write.lock().await;
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;
    }
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .await
      .map_err(|e| Error::io(&self.path, e))?;
    file
      .write_all(&line)
      .await
      .map_err(|e| Error::io(&self.path, e))?;
    file.flush().await.map_err(|e| Error::io(&self.path, e))?;

    info!(to = %email.to, subject = %email.subject, "price change queued");
    Ok(())
  }
}

/// The notifier selected at startup.
#[derive(Debug)]
pub enum ConfiguredNotifier {
  Log(LogNotifier),
  Outbox(OutboxNotifier),
}

impl Notifier for ConfiguredNotifier {
  type Error = Error;

  async fn send_price_change(&self, notice: &PriceChangeNotice) -> Result<()> {
    match self {
      Self::Log(n) => match n.send_price_change(notice).await {
        Ok(()) => Ok(()),
        Err(never) => match never {},
      },
      Self::Outbox(n) => n.send_price_change(notice).await,
    }
  }
}
