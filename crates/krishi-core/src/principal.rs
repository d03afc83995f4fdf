//! Admin accounts and the unified principal resolved at login.
//!
//! One login flow serves all three portals. The presented role selects the
//! lookup table and identifier field; the resolved [`Principal`] then travels
//! with the request as a single sum type instead of three parallel paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{executive::Executive, farmer::Farmer, role::Role};

/// A back-office administrator account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
  pub admin_id:      Uuid,
  /// Login identifier.
  pub username:      String,
  pub name:          String,
  /// Argon2 PHC string; never serialised into API responses.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_admin`].
#[derive(Debug, Clone)]
pub struct NewAdmin {
  pub username:      String,
  pub name:          String,
  pub password_hash: String,
}

/// The resolved identity behind a bearer token — one variant per portal role.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Principal {
  Admin(Admin),
  Executive(Executive),
  Farmer(Farmer),
}

impl Principal {
  pub fn role(&self) -> Role {
    match self {
      Self::Admin(_) => Role::Admin,
      Self::Executive(_) => Role::Executive,
      Self::Farmer(_) => Role::Farmer,
    }
  }

  pub fn id(&self) -> Uuid {
    match self {
      Self::Admin(a) => a.admin_id,
      Self::Executive(e) => e.executive_id,
      Self::Farmer(f) => f.farmer_id,
    }
  }

  /// The stored argon2 PHC string, for password verification.
  pub fn password_hash(&self) -> &str {
    match self {
      Self::Admin(a) => &a.password_hash,
      Self::Executive(e) => &e.password_hash,
      Self::Farmer(f) => &f.password_hash,
    }
  }

  /// The role-specific identifier this principal presents at login.
  pub fn identifier(&self) -> &str {
    match self {
      Self::Admin(a) => &a.username,
      Self::Executive(e) => &e.email,
      Self::Farmer(f) => &f.mobile,
    }
  }
}
