//! Scheme applications and their review workflow.
//!
//! Every status change appends an immutable history record; history rows are
//! never edited or removed, and their timestamps never decrease.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// Review state of a scheme application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
  Pending,
  UnderReview,
  Approved,
  Rejected,
  OnHold,
}

impl ApplicationStatus {
  /// Wire name, as stored and served.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::UnderReview => "under-review",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
      Self::OnHold => "on-hold",
    }
  }

  /// `approved` and `rejected` permit no further transitions.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Approved | Self::Rejected)
  }

  /// The full transition table:
  /// `pending → under-review → approved | rejected`, with `on-hold`
  /// reachable from `pending` and `under-review` and resumable only into
  /// `under-review`.
  pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::UnderReview)
        | (Self::Pending, Self::OnHold)
        | (Self::UnderReview, Self::Approved)
        | (Self::UnderReview, Self::Rejected)
        | (Self::UnderReview, Self::OnHold)
        | (Self::OnHold, Self::UnderReview)
    )
  }
}

impl std::fmt::Display for ApplicationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for ApplicationStatus {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "under-review" => Ok(Self::UnderReview),
      "approved" => Ok(Self::Approved),
      "rejected" => Ok(Self::Rejected),
      "on-hold" => Ok(Self::OnHold),
      other => Err(crate::Error::UnknownValue {
        kind:  "application status",
        value: other.to_owned(),
      }),
    }
  }
}

/// One immutable entry in an application's review history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
  pub status:     ApplicationStatus,
  pub remarks:    Option<String>,
  pub actor_role: Role,
  pub actor_id:   Uuid,
  pub changed_at: DateTime<Utc>,
}

/// A document attached to an application, verified individually during
/// review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDocument {
  pub document_id: Uuid,
  pub name:        String,
  pub verified:    bool,
}

/// A scheme application. `reference` is the human-readable unique id shown
/// to farmers (`APP-YYYYMMDD-NNNN`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeApplication {
  pub application_id: Uuid,
  pub reference:      String,
  pub farmer_id:      Uuid,
  pub scheme_id:      Uuid,
  pub status:         ApplicationStatus,
  /// Stamped on the first transition into a terminal state; never
  /// overwritten.
  pub reviewed_by:    Option<Uuid>,
  pub review_date:    Option<DateTime<Utc>>,
  pub submitted_at:   DateTime<Utc>,
}

/// The application read model served by detail endpoints: the row plus its
/// documents (in submission order) and full status history (oldest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetail {
  pub application: SchemeApplication,
  pub documents:   Vec<ApplicationDocument>,
  pub history:     Vec<StatusChange>,
}

/// Input to [`crate::store::PortalStore::create_application`].
#[derive(Debug, Clone)]
pub struct NewApplication {
  pub farmer_id: Uuid,
  pub scheme_id: Uuid,
  /// Names of the documents being submitted; all start unverified.
  pub documents: Vec<String>,
}

/// One entry in a document-verification batch.
#[derive(Debug, Clone, Copy)]
pub struct DocumentVerification {
  pub document_id: Uuid,
  pub verified:    bool,
}
