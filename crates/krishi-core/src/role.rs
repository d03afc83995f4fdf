//! Roles and actors — the discriminants of the three-portal permission model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The portal a principal belongs to. Every token carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Executive,
  Farmer,
}

impl Role {
  /// Wire name, as carried in JWT claims and JSON bodies.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Executive => "executive",
      Self::Farmer => "farmer",
    }
  }

  /// The profile field a principal of this role presents at login.
  pub fn identifier_field(self) -> &'static str {
    match self {
      Self::Admin => "username",
      Self::Executive => "email",
      Self::Farmer => "mobile",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Role {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Self::Admin),
      "executive" => Ok(Self::Executive),
      "farmer" => Ok(Self::Farmer),
      other => Err(crate::Error::UnknownValue {
        kind:  "role",
        value: other.to_owned(),
      }),
    }
  }
}

/// Who performed a workflow action. Recorded verbatim in audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub role: Role,
  pub id:   Uuid,
}

impl Actor {
  pub fn new(role: Role, id: Uuid) -> Self { Self { role, id } }
}
