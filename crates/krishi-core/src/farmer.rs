//! Farmer profiles and their uploaded field photos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// Self-declared gender on a farmer profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  Other,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "male",
      Self::Female => "female",
      Self::Other => "other",
    }
  }
}

impl std::fmt::Display for Gender {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Gender {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "male" => Ok(Self::Male),
      "female" => Ok(Self::Female),
      "other" => Ok(Self::Other),
      other => Err(crate::Error::UnknownValue {
        kind:  "gender",
        value: other.to_owned(),
      }),
    }
  }
}

/// A WGS-84 point attached to an uploaded field photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

/// A farmer profile.
///
/// `assigned_executive` is the single source of truth for the
/// executive↔farmer link; the executive's `assigned_farmers` list is derived
/// from it on read, so the two sides can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farmer {
  pub farmer_id:          Uuid,
  pub name:               String,
  /// Normalised mobile number; doubles as the login identifier.
  pub mobile:             String,
  pub village:            Option<String>,
  pub panchayat:          Option<String>,
  pub caste:              Option<String>,
  pub gender:             Option<Gender>,
  /// Declared annual income, in rupees.
  pub income:             Option<i64>,
  /// Income estimated during field verification, in rupees.
  pub estimated_income:   Option<i64>,
  /// CIBIL-style score in the 300-900 band.
  pub credit_score:       Option<u32>,
  pub crops:              Vec<String>,
  pub assigned_executive: Option<Uuid>,
  /// Schemes the farmer has bookmarked, in save order.
  pub saved_schemes:      Vec<Uuid>,
  #[serde(skip_serializing, default)]
  pub password_hash:      String,
  pub created_at:         DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_farmer`].
#[derive(Debug, Clone)]
pub struct NewFarmer {
  pub name:               String,
  pub mobile:             String,
  pub village:            Option<String>,
  pub panchayat:          Option<String>,
  pub caste:              Option<String>,
  pub gender:             Option<Gender>,
  pub income:             Option<i64>,
  pub estimated_income:   Option<i64>,
  pub credit_score:       Option<u32>,
  pub crops:              Vec<String>,
  pub assigned_executive: Option<Uuid>,
  pub password_hash:      String,
}

/// Partial profile update; `None` fields are left unchanged. The mobile
/// number is the login identifier and is not updatable through this path.
#[derive(Debug, Clone, Default)]
pub struct FarmerUpdate {
  pub name:             Option<String>,
  pub village:          Option<String>,
  pub panchayat:        Option<String>,
  pub caste:            Option<String>,
  pub gender:           Option<Gender>,
  pub income:           Option<i64>,
  pub estimated_income: Option<i64>,
  pub credit_score:     Option<u32>,
  pub crops:            Option<Vec<String>>,
}

/// An uploaded field photo; the binary lives on disk, not in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPhoto {
  pub photo_id:     Uuid,
  pub farmer_id:    Uuid,
  /// Path relative to the configured `photo_dir`.
  pub path:         String,
  /// SHA-256 hex digest of the file contents.
  pub content_hash: String,
  pub media_type:   String,
  pub uploaded_by:  Role,
  pub location:     Option<GeoPoint>,
  pub uploaded_at:  DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::add_field_photo`].
#[derive(Debug, Clone)]
pub struct NewFieldPhoto {
  pub farmer_id:    Uuid,
  pub path:         String,
  pub content_hash: String,
  pub media_type:   String,
  pub uploaded_by:  Role,
  pub location:     Option<GeoPoint>,
}
