//! Price alerts: user subscriptions to price changes of one device at one
//! provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Provider, Result};

// ─── Preferences ─────────────────────────────────────────────────────────────

/// When an alert fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPreferences {
  pub notify_on_any_change:     bool,
  pub notify_on_price_decrease: bool,
}

impl Default for AlertPreferences {
  fn default() -> Self {
    Self {
      notify_on_any_change:     true,
      notify_on_price_decrease: true,
    }
  }
}

impl AlertPreferences {
  /// Gate for a price move from `old` to `new`. Callers only ask once the
  /// price has actually changed.
  pub fn should_notify(&self, old: u32, new: u32) -> bool {
    self.notify_on_any_change || (self.notify_on_price_decrease && new < old)
  }

  /// Apply the fields present in `patch`, leaving the others untouched.
  pub fn apply(&mut self, patch: PreferencesPatch) {
    if let Some(v) = patch.notify_on_any_change {
      self.notify_on_any_change = v;
    }
    if let Some(v) = patch.notify_on_price_decrease {
      self.notify_on_price_decrease = v;
    }
  }
}

/// A partial update of [`AlertPreferences`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notify_on_any_change:     Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notify_on_price_decrease: Option<bool>,
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

/// A subscription to price changes of one (smartphone, provider) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
  pub id:               Uuid,
  pub email:            String,
  pub smartphone_id:    String,
  pub provider:         Provider,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_price:     Option<u32>,
  #[serde(default)]
  pub preferences:      AlertPreferences,
  pub created_at:       DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_notified_at: Option<DateTime<Utc>>,
}

/// The stored form of an email address: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

impl PriceAlert {
  /// Materialize a request into a stored alert with a fresh id.
  pub fn new(input: NewAlert, created_at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      email: normalize_email(&input.email),
      smartphone_id: input.smartphone_id,
      provider: input.provider,
      target_price: input.target_price,
      preferences: input.preferences.unwrap_or_default(),
      created_at,
      last_notified_at: None,
    }
  }

  /// True when this alert watches exactly `(smartphone_id, provider)`.
  pub fn watches(&self, smartphone_id: &str, provider: Provider) -> bool {
    self.smartphone_id == smartphone_id && self.provider == provider
  }

  /// Same subscriber, device and provider. Emails compare in their stored
  /// form.
  pub fn same_subscription(&self, email: &str, smartphone_id: &str, provider: Provider) -> bool {
    self.email == normalize_email(email) && self.watches(smartphone_id, provider)
  }
}

/// A request to create an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
  pub email:         String,
  pub smartphone_id: String,
  pub provider:      Provider,
  pub target_price:  Option<u32>,
  /// `None` means both notifications on.
  pub preferences:   Option<AlertPreferences>,
}

impl NewAlert {
  /// Reject addresses without a local part, an `@` and a dotted domain.
  pub fn validate(&self) -> Result<()> {
    let email = self.email.trim();
    let valid = !email.contains(char::is_whitespace)
      && email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
          && domain.contains('.')
          && domain.split('.').all(|label| !label.is_empty() && !label.contains('@'))
      });
    if valid {
      Ok(())
    } else {
      Err(Error::InvalidEmail(self.email.clone()))
    }
  }
}

/// The alert registry document: `{"alerts": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSet {
  #[serde(default)]
  pub alerts: Vec<PriceAlert>,
}

impl AlertSet {
  /// Alerts on exactly `(smartphone_id, provider)`.
  pub fn watching<'a>(
    &'a self,
    smartphone_id: &'a str,
    provider: Provider,
  ) -> impl Iterator<Item = &'a PriceAlert> + 'a {
    self
      .alerts
      .iter()
      .filter(move |a| a.watches(smartphone_id, provider))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn prefs(any: bool, decrease: bool) -> AlertPreferences {
    AlertPreferences {
      notify_on_any_change:     any,
      notify_on_price_decrease: decrease,
    }
  }

  #[test]
  fn decrease_only_ignores_increases() {
    let p = prefs(false, true);
    assert!(p.should_notify(900, 850));
    assert!(!p.should_notify(850, 900));
  }

  #[test]
  fn any_change_fires_both_ways() {
    let p = prefs(true, false);
    assert!(p.should_notify(900, 850));
    assert!(p.should_notify(850, 900));
  }

  #[test]
  fn all_off_never_fires() {
    let p = prefs(false, false);
    assert!(!p.should_notify(900, 1));
    assert!(!p.should_notify(1, 900));
  }

  #[test]
  fn patch_only_touches_present_fields() {
    let mut p = AlertPreferences::default();
    p.apply(PreferencesPatch {
      notify_on_any_change:     Some(false),
      notify_on_price_decrease: None,
    });
    assert_eq!(p, prefs(false, true));
  }

  #[test]
  fn new_alert_defaults_and_normalizes_email() {
    let alert = PriceAlert::new(
      NewAlert {
        email:         "  Jane@Example.BE ".into(),
        smartphone_id: "apple-iphone-15-128".into(),
        provider:      Provider::Orange,
        target_price:  None,
        preferences:   None,
      },
      Utc::now(),
    );
    assert_eq!(alert.email, "jane@example.be");
    assert_eq!(alert.preferences, AlertPreferences::default());
    assert!(alert.same_subscription("JANE@example.be", "apple-iphone-15-128", Provider::Orange));
    assert!(!alert.same_subscription("jane@example.be", "apple-iphone-15-128", Provider::Voo));
  }

  #[test]
  fn accented_emails_match_in_any_case() {
    let alert = PriceAlert::new(
      NewAlert {
        email:         "ÉLODIE@Exemple.be".into(),
        smartphone_id: "apple-iphone-15-128".into(),
        provider:      Provider::Voo,
        target_price:  None,
        preferences:   None,
      },
      Utc::now(),
    );
    assert_eq!(alert.email, "élodie@exemple.be");
    assert!(alert.same_subscription("élodie@exemple.be", "apple-iphone-15-128", Provider::Voo));
    assert!(alert.same_subscription(" Élodie@EXEMPLE.BE", "apple-iphone-15-128", Provider::Voo));
  }

  #[test]
  fn email_shape_is_checked() {
    let request = |email: &str| NewAlert {
      email:         email.into(),
      smartphone_id: "x".into(),
      provider:      Provider::Voo,
      target_price:  None,
      preferences:   None,
    };
    assert!(request("jane@example.be").validate().is_ok());
    for bad in ["", "jane", "@example.be", "jane@localhost", "jane@example.", "ja ne@x.be"] {
      assert!(request(bad).validate().is_err(), "{bad:?} accepted");
    }
  }

  #[test]
  fn registry_document_round_trips_optional_fields() {
    let json = serde_json::json!({
      "alerts": [{
        "id": "6f1c1e9e-3d43-4d8e-9d55-1f0b0c2a7a10",
        "email": "a@b.be",
        "smartphoneId": "google-pixel-8-128",
        "provider": "voo",
        "targetPrice": 500,
        "preferences": { "notifyOnAnyChange": false, "notifyOnPriceDecrease": true },
        "createdAt": "2025-01-05T10:00:00Z",
        "lastNotifiedAt": "2025-02-01T08:30:00Z"
      }]
    });
    let set: AlertSet = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(set.alerts[0].target_price, Some(500));
    assert_eq!(set.watching("google-pixel-8-128", Provider::Voo).count(), 1);
    assert_eq!(set.watching("google-pixel-8-128", Provider::Orange).count(), 0);

    let back = serde_json::to_value(&set).unwrap();
    assert_eq!(back["alerts"][0]["targetPrice"], 500);
    assert_eq!(back["alerts"][0]["lastNotifiedAt"], "2025-02-01T08:30:00Z");
  }
}
