//! Support requests raised by farmers and worked by executives.
//!
//! A request moves through a strict state machine. Comments form an
//! append-only trail; they are never edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// Workflow state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
  Pending,
  InProgress,
  Resolved,
  Rejected,
}

impl RequestStatus {
  /// Wire name, as stored and served.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::InProgress => "in-progress",
      Self::Resolved => "resolved",
      Self::Rejected => "rejected",
    }
  }

  /// `resolved` and `rejected` permit no further transitions.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Resolved | Self::Rejected)
  }

  /// The full transition table:
  /// `pending → in-progress → resolved | rejected`.
  pub fn can_transition_to(self, next: RequestStatus) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::InProgress)
        | (Self::InProgress, Self::Resolved)
        | (Self::InProgress, Self::Rejected)
    )
  }
}

impl std::fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for RequestStatus {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "in-progress" => Ok(Self::InProgress),
      "resolved" => Ok(Self::Resolved),
      "rejected" => Ok(Self::Rejected),
      other => Err(crate::Error::UnknownValue {
        kind:  "request status",
        value: other.to_owned(),
      }),
    }
  }
}

/// Farmer-declared urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
    }
  }
}

impl std::fmt::Display for Priority {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Priority {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low" => Ok(Self::Low),
      "medium" => Ok(Self::Medium),
      "high" => Ok(Self::High),
      other => Err(crate::Error::UnknownValue {
        kind:  "priority",
        value: other.to_owned(),
      }),
    }
  }
}

/// A support request (ticket). `farmer_id` never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
  pub request_id:         Uuid,
  pub farmer_id:          Uuid,
  /// Set when an executive claims the request; cleared only if that
  /// executive is later deleted.
  pub assigned_executive: Option<Uuid>,
  pub title:              String,
  pub description:        String,
  /// Free-text category, e.g. "irrigation" or "soil-testing".
  pub category:           Option<String>,
  pub priority:           Priority,
  pub status:             RequestStatus,
  pub created_at:         DateTime<Utc>,
  /// Stamped on the first transition into `resolved`; never overwritten.
  pub resolved_at:        Option<DateTime<Utc>>,
}

/// Input to [`crate::store::PortalStore::create_request`].
#[derive(Debug, Clone)]
pub struct NewRequest {
  pub farmer_id:   Uuid,
  pub title:       String,
  pub description: String,
  pub category:    Option<String>,
  pub priority:    Priority,
}

/// Partial edit of a still-pending request; `None` fields are left
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct RequestUpdate {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub priority:    Option<Priority>,
}

/// A comment on a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestComment {
  pub comment_id:  Uuid,
  pub request_id:  Uuid,
  pub author_role: Role,
  pub author_id:   Uuid,
  pub body:        String,
  pub posted_at:   DateTime<Utc>,
}

/// The request read model served by detail endpoints: the ticket plus its
/// full comment trail in posting order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetail {
  pub request:  Request,
  pub comments: Vec<RequestComment>,
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [RequestStatus; 4] = [
    RequestStatus::Pending,
    RequestStatus::InProgress,
    RequestStatus::Resolved,
    RequestStatus::Rejected,
  ];

  #[test]
  fn pending_moves_only_to_in_progress() {
    assert!(RequestStatus::Pending.can_transition_to(RequestStatus::InProgress));
    assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Resolved));
    assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
    assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
  }

  #[test]
  fn in_progress_reaches_both_terminals() {
    assert!(
      RequestStatus::InProgress.can_transition_to(RequestStatus::Resolved)
    );
    assert!(
      RequestStatus::InProgress.can_transition_to(RequestStatus::Rejected)
    );
    assert!(
      !RequestStatus::InProgress.can_transition_to(RequestStatus::Pending)
    );
  }

  #[test]
  fn terminal_states_reject_every_transition() {
    for terminal in [RequestStatus::Resolved, RequestStatus::Rejected] {
      assert!(terminal.is_terminal());
      for next in ALL {
        assert!(!terminal.can_transition_to(next));
      }
    }
  }

  #[test]
  fn wire_names_round_trip() {
    for status in ALL {
      assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
    }
  }
}
