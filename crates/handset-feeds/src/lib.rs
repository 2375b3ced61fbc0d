//! Provider feed codec for the handset catalog.
//!
//! Turns raw provider JSON documents into [`ExtractedPhone`] records, driven
//! by a declarative [`FeedMappings`] document. Pure synchronous; no file or
//! runtime dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use handset_core::Provider;
//! use handset_feeds::{FeedMappings, extract};
//!
//! let feed = serde_json::json!({ "smartphones": [] });
//! let out = extract(Provider::Voo, &feed, &FeedMappings::default());
//! println!("{} of {} items usable", out.items.len(), out.total);
//! ```

pub mod error;
mod extract;
pub mod item;
pub mod mapping;
pub mod transform;

pub use error::{Error, Result};
pub use extract::{ExtractedPhone, Extraction, extract, extract_feed};
pub use item::{ProviderFeed, Scalar};
pub use mapping::{FeedMappings, FieldMapping, FieldRule, ProviderMapping};
pub use transform::{FieldValue, Transform};
