//! Per-farmer field condition, maintained by the assigned executive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Traffic-light condition of a farmer's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldHealth {
  Green,
  Yellow,
  Red,
}

impl FieldHealth {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Green => "green",
      Self::Yellow => "yellow",
      Self::Red => "red",
    }
  }
}

impl std::fmt::Display for FieldHealth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for FieldHealth {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "green" => Ok(Self::Green),
      "yellow" => Ok(Self::Yellow),
      "red" => Ok(Self::Red),
      other => Err(crate::Error::UnknownValue {
        kind:  "field health",
        value: other.to_owned(),
      }),
    }
  }
}

/// The current field condition for one farmer. At most one record per
/// farmer; updates overwrite in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStatus {
  pub farmer_id:  Uuid,
  pub health:     FieldHealth,
  pub notes:      Option<String>,
  pub updated_at: DateTime<Utc>,
}
