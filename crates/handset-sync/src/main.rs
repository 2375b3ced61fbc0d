//! `handset`: smartphone catalog sync and price alerts.
//!
//! # Usage
//!
//! ```
//! handset sync
//! handset check-prices --dry-run
//! handset alerts add --email jane@example.be --smartphone samsung-galaxy-s24-256 --provider voo
//! handset --config /etc/handset.toml alerts list jane@example.be
//! ```
//!
//! Settings come from `handset.toml` (or `--config`) and `HANDSET_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use handset_core::{AlertPreferences, NewAlert, PreferencesPatch, Provider};
use handset_feeds::FeedMappings;
use handset_store_json::JsonStore;
use handset_sync::{
  ConfiguredNotifier, LogNotifier, OutboxNotifier, SyncConfig, load_mappings, run_price_check,
  run_sync,
};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Smartphone catalog sync and price alerts")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "handset.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Rebuild the catalog from the provider feeds.
  Sync,
  /// Record current prices and notify matching alerts.
  CheckPrices {
    /// Log notifications instead of queueing them.
    #[arg(long)]
    dry_run: bool,
  },
  /// Manage price alerts.
  #[command(subcommand)]
  Alerts(AlertsCommand),
  /// Print the effective feed field mapping as JSON.
  Mappings,
}

#[derive(Subcommand)]
enum AlertsCommand {
  /// Subscribe an email to a device's price at one provider.
  Add {
    #[arg(long)]
    email:        String,
    #[arg(long)]
    smartphone:   String,
    #[arg(long)]
    provider:     Provider,
    #[arg(long, value_enum, default_value_t = AlertKind::AnyChange)]
    kind:         AlertKind,
    #[arg(long)]
    target_price: Option<u32>,
  },
  /// Delete an alert by id.
  Remove { id: Uuid },
  /// List the alerts registered by an email.
  List { email: String },
  /// Change an alert's notification preferences.
  SetPreferences {
    id:             Uuid,
    #[arg(long)]
    any_change:     Option<bool>,
    #[arg(long)]
    price_decrease: Option<bool>,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlertKind {
  /// Every change, up or down.
  AnyChange,
  /// Decreases only.
  PriceDrop,
}

impl From<AlertKind> for AlertPreferences {
  fn from(kind: AlertKind) -> Self {
    match kind {
      AlertKind::AnyChange => AlertPreferences {
        notify_on_any_change:     true,
        notify_on_price_decrease: false,
      },
      AlertKind::PriceDrop => AlertPreferences {
        notify_on_any_change:     false,
        notify_on_price_decrease: true,
      },
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HANDSET"))
    .build()
    .context("failed to read config file")?;
  let mut cfg: SyncConfig = settings
    .try_deserialize()
    .context("failed to deserialise SyncConfig")?;
  cfg.data_dir = expand_tilde(&cfg.data_dir);

  let store = JsonStore::new(cfg.store_paths());

  match cli.command {
    Command::Sync => {
      let report = run_sync(&cfg, &store).await.context("sync failed")?;
      print_json(&report)?;
    }
    Command::CheckPrices { dry_run } => {
      let notifier = notifier(&cfg, dry_run);
      let report = run_price_check(&cfg, &store, &notifier, Utc::now().date_naive())
        .await
        .context("price check failed")?;
      print_json(&report)?;
    }
    Command::Alerts(cmd) => alerts(&store, cmd).await?,
    Command::Mappings => {
      let mappings: FeedMappings = load_mappings(&cfg)
        .await
        .context("failed to load feed mappings")?;
      println!("{}", mappings.to_json_pretty()?);
    }
  }

  Ok(())
}

async fn alerts(store: &JsonStore, cmd: AlertsCommand) -> anyhow::Result<()> {
  match cmd {
    AlertsCommand::Add {
      email,
      smartphone,
      provider,
      kind,
      target_price,
    } => {
      let alert = store
        .create_alert(NewAlert {
          email,
          smartphone_id: smartphone,
          provider,
          target_price,
          preferences: Some(kind.into()),
        })
        .await
        .context("failed to create alert")?;
      print_json(&alert)?;
    }
    AlertsCommand::Remove { id } => {
      let removed = store
        .delete_alert(id)
        .await
        .context("failed to delete alert")?;
      print_json(&removed)?;
    }
    AlertsCommand::List { email } => {
      let alerts = store
        .alerts_by_email(&email)
        .await
        .context("failed to list alerts")?;
      print_json(&alerts)?;
    }
    AlertsCommand::SetPreferences {
      id,
      any_change,
      price_decrease,
    } => {
      let updated = store
        .update_alert_preferences(id, PreferencesPatch {
          notify_on_any_change:     any_change,
          notify_on_price_decrease: price_decrease,
        })
        .await
        .context("failed to update alert")?;
      print_json(&updated)?;
    }
  }
  Ok(())
}

fn notifier(cfg: &SyncConfig, dry_run: bool) -> ConfiguredNotifier {
  match cfg.outbox_path() {
    Some(path) if !dry_run => {
      ConfiguredNotifier::Outbox(OutboxNotifier::new(path, &cfg.mail_from, &cfg.base_url))
    }
    _ => ConfiguredNotifier::Log(LogNotifier {
      from:     cfg.mail_from.clone(),
      base_url: cfg.base_url.clone(),
    }),
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
