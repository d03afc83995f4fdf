//! The portal-wide settings singleton.
//!
//! Exactly one record exists; it is created with defaults on first read.
//! Runtime configuration (ports, secrets, provider credentials) does not
//! live here — it arrives through the server config instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named message template used when notifying farmers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
  pub name: String,
  /// Template body; `{placeholders}` are substituted by the caller.
  pub body: String,
}

/// Portal-wide toggles and notification templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
  pub notification_templates: Vec<NotificationTemplate>,
  /// When false, bulk SMS batches run in simulated mode regardless of
  /// provider configuration.
  pub sms_enabled:            bool,
  pub maintenance_mode:       bool,
  pub updated_at:             DateTime<Utc>,
}

impl Settings {
  /// The record inserted on first read.
  pub fn initial(now: DateTime<Utc>) -> Self {
    Self {
      notification_templates: vec![
        NotificationTemplate {
          name: "scheme_alert".to_owned(),
          body: "New scheme {scheme} is open for applications.".to_owned(),
        },
        NotificationTemplate {
          name: "request_update".to_owned(),
          body: "Your request {title} is now {status}.".to_owned(),
        },
      ],
      sms_enabled:            true,
      maintenance_mode:       false,
      updated_at:             now,
    }
  }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
  pub notification_templates: Option<Vec<NotificationTemplate>>,
  pub sms_enabled:            Option<bool>,
  pub maintenance_mode:       Option<bool>,
}
