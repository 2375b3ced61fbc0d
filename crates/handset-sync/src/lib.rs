//! Feed sync and price tracking jobs.
//!
//! [`run_sync`] reads the three provider feeds, reconciles them into one
//! catalog and persists it. [`run_price_check`] diffs that catalog against
//! the price history and notifies subscribers whose alerts match.
//!
//! Both jobs work against the [`handset_core`] store traits; the `handset`
//! binary wires them to [`handset_store_json::JsonStore`].

pub mod config;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod tracker;


pub use config::{FeedFiles, SyncConfig};
pub use error::{Error, Result};
pub use notify::{ConfiguredNotifier, LogNotifier, OutboxNotifier, PriceChangeEmail};
pub use pipeline::{FeedSummary, SyncReport, load_feed, load_mappings, run_price_check, run_sync};
pub use reconcile::{MergeField, MergePolicy, MergeRule, Reconciled, reconcile, reconcile_onto};
pub use tracker::{PriceChange, PriceCheckReport, record_prices, track_prices};
