//! Price tracking: diff the catalog against the history log and notify the
//! alerts whose preferences match each change.

use chrono::NaiveDate;
use handset_core::{
  AlertSet, Notifier, PriceAlert, PriceChangeNotice, PriceHistory, PriceHistoryEntry, Provider,
  Smartphone,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One observed change of a provider's quote for a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange<'a> {
  pub smartphone: &'a Smartphone,
  pub provider:   Provider,
  pub old_price:  u32,
  pub new_price:  u32,
}

/// Counters for one price-check pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCheckReport {
  /// Series created for pairs seen for the first time.
  pub seeded:    usize,
  pub unchanged: usize,
  pub changed:   usize,
  /// Quotes at `0`, which carry no price and are not recorded.
  pub unpriced:  usize,
  /// Notifications delivered.
  pub notified:  usize,
  /// Notifications the notifier rejected.
  pub failed:    usize,
}

/// Record today's quotes into `history`.
///
/// A pair without a series gets one seeded with the current price. A pair
/// whose latest point already carries the current price is left alone. A
/// different price is appended and returned as a change. A quote of `0`
/// means the provider gave no price; it is counted and otherwise ignored, so
/// the series keeps its last real price.
pub fn record_prices<'a>(
  catalog: &'a [Smartphone],
  history: &mut PriceHistory,
  today: NaiveDate,
  report: &mut PriceCheckReport,
) -> Vec<PriceChange<'a>> {
  let mut changes = Vec::new();

  for phone in catalog {
    for (&provider, quote) in &phone.upfront_prices {
      if quote.price == 0 {
        report.unpriced += 1;
        continue;
      }

      let Some(entry) = history.get_mut(&phone.id, provider) else {
        history.insert(PriceHistoryEntry::seeded(&phone.id, provider, quote.price, today));
        report.seeded += 1;
        continue;
      };

      let previous = entry.latest().map(|p| p.price);
      match previous {
        Some(old) if old == quote.price => report.unchanged += 1,
        Some(old) => {
          entry.append(quote.price, today);
          report.changed += 1;
          changes.push(PriceChange {
            smartphone: phone,
            provider,
            old_price: old,
            new_price: quote.price,
          });
        }
        // A series with no points only comes from a hand-edited file.
        None => {
          entry.append(quote.price, today);
          report.seeded += 1;
        }
      }
    }
  }

  changes
}

/// The alerts a change should reach: those watching the pair whose
/// preferences accept the direction of the move.
pub fn recipients<'a>(
  alerts: &'a AlertSet,
  change: &'a PriceChange<'_>,
) -> impl Iterator<Item = &'a PriceAlert> + 'a {
  alerts
    .watching(&change.smartphone.id, change.provider)
    .filter(|a| a.preferences.should_notify(change.old_price, change.new_price))
}

/// Run a full pass: record prices, then notify every qualifying alert.
///
/// A failed notification is logged and counted; the pass continues and the
/// history update stands.
pub async fn track_prices<N: Notifier>(
  catalog: &[Smartphone],
  history: &mut PriceHistory,
  alerts: &AlertSet,
  notifier: &N,
  today: NaiveDate,
) -> PriceCheckReport {
  let mut report = PriceCheckReport::default();
  let changes = record_prices(catalog, history, today, &mut report);

  for change in &changes {
    debug!(
      smartphone = %change.smartphone.id,
      provider = %change.provider,
      old = change.old_price,
      new = change.new_price,
      "price changed"
    );

    let smartphone = change.smartphone.narrowed_to(change.provider);
    for alert in recipients(alerts, change) {
      let notice = PriceChangeNotice {
        email:      alert.email.clone(),
        smartphone: smartphone.clone(),
        provider:   change.provider,
        old_price:  change.old_price,
        new_price:  change.new_price,
        alert:      alert.clone(),
      };
      match notifier.send_price_change(&notice).await {
        Ok(()) => report.notified += 1,
        Err(e) => {
          warn!(alert = %alert.id, error = %e, "price change notification failed");
          report.failed += 1;
        }
      }
    }
  }

  info!(
    seeded = report.seeded,
    unchanged = report.unchanged,
    changed = report.changed,
    unpriced = report.unpriced,
    notified = report.notified,
    failed = report.failed,
    "price check complete"
  );
  report
}
