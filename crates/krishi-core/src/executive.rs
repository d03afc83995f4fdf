//! Executive (field officer) accounts and their SMS dispatch log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A field executive account.
///
/// `assigned_farmers` is derived on read from the farmer rows pointing at
/// this executive; it is never written directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Executive {
  pub executive_id:     Uuid,
  pub name:             String,
  /// Login identifier.
  pub email:            String,
  pub mobile:           Option<String>,
  pub region:           Option<String>,
  pub assigned_farmers: Vec<Uuid>,
  #[serde(skip_serializing, default)]
  pub password_hash:    String,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_executive`].
#[derive(Debug, Clone)]
pub struct NewExecutive {
  pub name:          String,
  pub email:         String,
  pub mobile:        Option<String>,
  pub region:        Option<String>,
  pub password_hash: String,
}

/// Partial profile update; `None` fields are left unchanged. The email is
/// the login identifier and is not updatable through this path.
#[derive(Debug, Clone, Default)]
pub struct ExecutiveUpdate {
  pub name:   Option<String>,
  pub mobile: Option<String>,
  pub region: Option<String>,
}

/// One bulk-SMS dispatch outcome, appended to the sending executive's log.
/// The log is append-only with no retention cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsLogEntry {
  pub entry_id:     Uuid,
  pub executive_id: Uuid,
  pub message:      String,
  /// Normalised recipient numbers, in dispatch order.
  pub recipients:   Vec<String>,
  pub sent:         u32,
  pub failed:       u32,
  /// True when the batch ran without a configured provider.
  pub simulated:    bool,
  pub sent_at:      DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::append_sms_log`].
#[derive(Debug, Clone)]
pub struct NewSmsLogEntry {
  pub executive_id: Uuid,
  pub message:      String,
  pub recipients:   Vec<String>,
  pub sent:         u32,
  pub failed:       u32,
  pub simulated:    bool,
}
